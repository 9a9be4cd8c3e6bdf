//! Goal title parser
//!
//! Turns r/soccer clip titles such as
//! `Arsenal [1]-0 Leeds United - Thierry Henry 78'` into a `GoalRecord`.
//!
//! Titles are hand-written and inconsistent, so extraction runs through
//! ordered strategies and the first one that matches wins:
//!
//! 1. `<home> <hs> - <as> <away> - <scorer and minute>`
//! 2. `<home> <hs> - <as> <rest>`, splitting `<rest>` on its last hyphen
//!
//! Either score may carry brackets marking the side that just scored. They
//! are informational; the home score is always the first number.

use crate::errors::ParseError;
use blooters_common::GoalRecord;
use regex_lite::Regex;
use std::sync::OnceLock;

/// Trailing marks written after a minute: primes, apostrophe, quotes
const MINUTE_MARKS: &[char] = &['\u{2032}', '\u{2033}', '\'', '"', '\u{2019}'];

/// Scorer suffixes meaning "penalty" or "own goal", matched bare or in
/// parentheses at the end of the scorer text
const SCORER_MODIFIERS: &[&str] = &["penalty", "pen.", "pen", "own goal", "o.g.", "og"];

fn primary_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(.+?)\s+\[?(\d+)\]?\s*-\s*\[?(\d+)\]?\s+(.+?)\s*-\s*(.+)$")
            .expect("primary title pattern compiles")
    })
}

fn fallback_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(.+?)\s+\[?(\d+)\]?\s*-\s*\[?(\d+)\]?\s+(.+)$")
            .expect("fallback title pattern compiles")
    })
}

fn minute_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^(.+?)\s+(\d+(?:\+\d+)?)['"\x{2032}\x{2033}\x{2019}]?$"#)
            .expect("minute pattern compiles")
    })
}

/// Title split into its raw parts, all trimmed
#[derive(Debug, PartialEq, Eq)]
struct TitleParts<'a> {
    home_team: &'a str,
    home_score: &'a str,
    away_score: &'a str,
    away_team: &'a str,
    scorer_segment: &'a str,
}

/// Collapse whitespace runs and map dash variants to a plain hyphen.
pub fn normalize_title(title: &str) -> String {
    title
        .replace(['\u{2012}', '\u{2013}', '\u{2014}', '\u{2015}', '\u{2212}'], "-")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a post title into a goal.
///
/// Fails only when no score pattern is found; an unreadable scorer or
/// minute leaves those fields empty instead.
pub fn parse_goal_title(title: &str, url: &str) -> Result<GoalRecord, ParseError> {
    let normalized = normalize_title(title);

    let parts = split_title(&normalized).ok_or_else(|| ParseError::NotAGoalTitle {
        title: title.to_string(),
    })?;

    let home_score = parse_score(parts.home_score, title)?;
    let away_score = parse_score(parts.away_score, title)?;
    let (goalscorer, minute) = split_scorer_and_minute(parts.scorer_segment);

    Ok(GoalRecord {
        description: title.to_string(),
        url: url.to_string(),
        home_team: parts.home_team.to_string(),
        away_team: parts.away_team.to_string(),
        home_score,
        away_score,
        goalscorer,
        minute,
        // Leading side, kept as-is; see GoalRecord::away
        away: away_score > home_score,
        ..Default::default()
    })
}

fn parse_score(raw: &str, title: &str) -> Result<i32, ParseError> {
    raw.parse::<i32>().map_err(|_| ParseError::ScoreOutOfRange {
        title: title.to_string(),
    })
}

fn split_title(normalized: &str) -> Option<TitleParts<'_>> {
    if let Some(caps) = primary_pattern().captures(normalized) {
        let parts = TitleParts {
            home_team: caps.get(1)?.as_str().trim(),
            home_score: caps.get(2)?.as_str(),
            away_score: caps.get(3)?.as_str(),
            away_team: caps.get(4)?.as_str().trim(),
            scorer_segment: caps.get(5)?.as_str().trim(),
        };
        return non_empty_teams(parts);
    }

    let caps = fallback_pattern().captures(normalized)?;
    let rest = caps.get(4)?.as_str().trim();

    // No clean separator before the scorer. Take the last hyphen in the
    // remainder; without one the team cannot be told apart from the scorer.
    let (away_team, scorer_segment) = match rest.rfind('-') {
        Some(idx) if !rest[..idx].trim().is_empty() => (rest[..idx].trim(), rest[idx + 1..].trim()),
        _ => (rest, rest),
    };

    non_empty_teams(TitleParts {
        home_team: caps.get(1)?.as_str().trim(),
        home_score: caps.get(2)?.as_str(),
        away_score: caps.get(3)?.as_str(),
        away_team,
        scorer_segment,
    })
}

fn non_empty_teams(parts: TitleParts<'_>) -> Option<TitleParts<'_>> {
    if parts.home_team.is_empty() || parts.away_team.is_empty() {
        None
    } else {
        Some(parts)
    }
}

/// Split `Thierry Henry 78'` into scorer and minute.
fn split_scorer_and_minute(segment: &str) -> (String, String) {
    if let Some(caps) = minute_pattern().captures(segment) {
        let raw_scorer = caps.get(1).map_or("", |m| m.as_str());
        let minute = caps.get(2).map_or("", |m| m.as_str());
        return (title_case(&strip_modifiers(raw_scorer)), minute.to_string());
    }

    // Minute with unexpected trailing tokens: last token is the minute
    let tokens: Vec<&str> = segment.split_whitespace().collect();
    match tokens.as_slice() {
        [] => (String::new(), String::new()),
        [only] => (only.to_string(), String::new()),
        [scorer @ .., last] => (
            scorer.join(" "),
            last.trim_end_matches(MINUTE_MARKS).to_string(),
        ),
    }
}

/// Lowercase and drop trailing penalty / own-goal markers.
fn strip_modifiers(raw: &str) -> String {
    let mut scorer = raw.trim().to_lowercase();

    'outer: loop {
        for modifier in SCORER_MODIFIERS {
            for suffix in [format!(" ({})", modifier), format!(" {}", modifier)] {
                if let Some(stripped) = scorer.strip_suffix(suffix.as_str()) {
                    scorer = stripped.trim_end().to_string();
                    continue 'outer;
                }
            }
        }
        break;
    }

    scorer
}

/// Upper-case the first letter of every word.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word_start = true;

    for c in text.chars() {
        if word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        word_start = !(c.is_alphanumeric() || c == '_');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://streamable.com/abc";

    fn parse(title: &str) -> GoalRecord {
        parse_goal_title(title, URL).unwrap()
    }

    #[test]
    fn test_parse_goal_titles() {
        let cases = [
            ("Newcastle United 0-1 Arsenal - Dennis Bergkamp 11'", "Newcastle United", "Arsenal", 0, 1, "Dennis Bergkamp", "11"),
            ("Arsenal [1]-0 Leeds United - Thierry Henry 78'", "Arsenal", "Leeds United", 1, 0, "Thierry Henry", "78"),
            ("Cheltenham 0-[2] Notts County - Gabriel 27'", "Cheltenham", "Notts County", 0, 2, "Gabriel", "27"),
            ("Cheltenham 0-[2] Notts County - Tyrese Hall 27'", "Cheltenham", "Notts County", 0, 2, "Tyrese Hall", "27"),
        ];

        for (title, home, away, hs, aws, scorer, minute) in cases {
            let goal = parse(title);
            assert_eq!(goal.home_team, home, "{}", title);
            assert_eq!(goal.away_team, away, "{}", title);
            assert_eq!(goal.home_score, hs, "{}", title);
            assert_eq!(goal.away_score, aws, "{}", title);
            assert_eq!(goal.goalscorer, scorer, "{}", title);
            assert_eq!(goal.minute, minute, "{}", title);
        }
    }

    #[test]
    fn test_record_keeps_source() {
        let title = "Newcastle United 0-1 Arsenal - Dennis Bergkamp 11'";
        let goal = parse(title);
        assert_eq!(goal.description, title);
        assert_eq!(goal.url, URL);
        assert_eq!(goal.mirrors, None);
        assert_eq!(goal.id, 0);
    }

    #[test]
    fn test_brackets_do_not_change_scores() {
        let plain = parse("Real Madrid 2-1 Barcelona - Vinicius Junior 64'");
        for title in [
            "Real Madrid [2]-1 Barcelona - Vinicius Junior 64'",
            "Real Madrid 2-[1] Barcelona - Vinicius Junior 64'",
            "Real Madrid [2] - [1] Barcelona - Vinicius Junior 64'",
        ] {
            let bracketed = parse(title);
            assert_eq!(bracketed.home_score, plain.home_score, "{}", title);
            assert_eq!(bracketed.away_score, plain.away_score, "{}", title);
            assert_eq!(bracketed.home_team, plain.home_team, "{}", title);
            assert_eq!(bracketed.away_team, plain.away_team, "{}", title);
        }
    }

    #[test]
    fn test_dash_and_whitespace_variants() {
        let goal = parse("Liverpool  3 \u{2013} 1  Everton \u{2014} Mohamed  Salah 90+7'");
        assert_eq!(goal.home_team, "Liverpool");
        assert_eq!(goal.away_team, "Everton");
        assert_eq!(goal.home_score, 3);
        assert_eq!(goal.away_score, 1);
        assert_eq!(goal.goalscorer, "Mohamed Salah");
        assert_eq!(goal.minute, "90+7");
    }

    #[test]
    fn test_minute_marks() {
        assert_eq!(parse("Lazio 1-0 Roma - Immobile 12\u{2032}").minute, "12");
        assert_eq!(parse("Lazio 1-0 Roma - Immobile 12\u{2019}").minute, "12");
        assert_eq!(parse("Lazio 1-0 Roma - Immobile 12").minute, "12");
        assert_eq!(parse("Lazio 1-0 Roma - Immobile 12\"").minute, "12");
        assert_eq!(parse("Lazio 1-0 Roma - Immobile 12\u{2033}").minute, "12");
        assert_eq!(parse("Lazio 1-0 Roma - Immobile 90+2\"").minute, "90+2");
        assert_eq!(parse("Lazio 1-0 Roma - Immobile 12\"").goalscorer, "Immobile");
    }

    #[test]
    fn test_hyphenated_home_team() {
        let goal = parse("Paris Saint-Germain 2-0 Lyon - Kylian Mbappe 33'");
        assert_eq!(goal.home_team, "Paris Saint-Germain");
        assert_eq!(goal.away_team, "Lyon");
        assert_eq!(goal.goalscorer, "Kylian Mbappe");
    }

    #[test]
    fn test_hyphenated_away_team_splits_early() {
        // The first separator after the score wins, so a hyphenated away
        // team loses its tail to the scorer segment
        let goal = parse("Arsenal 1-0 Paris Saint-Germain - Kylian Mbappe 33'");
        assert_eq!(goal.home_team, "Arsenal");
        assert_eq!(goal.away_team, "Paris Saint");
        assert_eq!(goal.goalscorer, "Germain - Kylian Mbappe");
        assert_eq!(goal.minute, "33");
    }

    #[test]
    fn test_penalty_and_own_goal_markers() {
        assert_eq!(parse("Arsenal 1-0 Chelsea - Bukayo Saka (pen) 45'").goalscorer, "Bukayo Saka");
        assert_eq!(parse("Arsenal 1-0 Chelsea - Bukayo Saka pen 45'").goalscorer, "Bukayo Saka");
        assert_eq!(parse("Arsenal 1-0 Chelsea - Bukayo Saka (Penalty) 45'").goalscorer, "Bukayo Saka");
        assert_eq!(parse("Arsenal 2-0 Chelsea - Thiago Silva (OG) 51'").goalscorer, "Thiago Silva");
        assert_eq!(parse("Arsenal 2-0 Chelsea - Thiago Silva own goal 51'").goalscorer, "Thiago Silva");
        assert_eq!(parse("Arsenal 1-0 Chelsea - Bukayo Saka (pen.) 45'").goalscorer, "Bukayo Saka");
        assert_eq!(parse("Arsenal 1-0 Chelsea - Bukayo Saka pen. 45'").goalscorer, "Bukayo Saka");
        assert_eq!(parse("Arsenal 2-0 Chelsea - Thiago Silva (o.g.) 51'").goalscorer, "Thiago Silva");
    }

    #[test]
    fn test_modifier_only_stripped_as_suffix() {
        // "pen" inside a name is left alone
        assert_eq!(parse("Ajax 1-0 PSV - Penelope Pen Hart 10'").goalscorer, "Penelope Pen Hart");
    }

    #[test]
    fn test_scorer_is_title_cased() {
        assert_eq!(parse("Arsenal 1-0 Chelsea - THIERRY HENRY 5'").goalscorer, "Thierry Henry");
        assert_eq!(parse("Arsenal 1-0 Chelsea - john o'shea 5'").goalscorer, "John O'Shea");
    }

    #[test]
    fn test_minute_with_trailing_tokens_uses_last_token() {
        // Minute pattern fails, token fallback keeps raw scorer text
        let goal = parse("Arsenal 1-0 Chelsea - Saka 45' (great goal)");
        assert_eq!(goal.goalscorer, "Saka 45' (great");
        assert_eq!(goal.minute, "goal)");
    }

    #[test]
    fn test_scorer_without_minute() {
        let goal = parse("Arsenal 1-0 Chelsea - Saka");
        assert_eq!(goal.goalscorer, "Saka");
        assert_eq!(goal.minute, "");
    }

    #[test]
    fn test_fallback_without_scorer_separator() {
        // Team and scorer run together; the away team is degraded
        let goal = parse("Arsenal 2-0 Chelsea Henry 45'");
        assert_eq!(goal.home_team, "Arsenal");
        assert_eq!(goal.away_team, "Chelsea Henry 45'");
        assert_eq!(goal.home_score, 2);
        assert_eq!(goal.away_score, 0);
        assert_eq!(goal.goalscorer, "Chelsea Henry");
        assert_eq!(goal.minute, "45");
    }

    #[test]
    fn test_fallback_trailing_hyphen() {
        let goal = parse("Arsenal 2-0 Chelsea -");
        assert_eq!(goal.away_team, "Chelsea");
        assert_eq!(goal.goalscorer, "");
        assert_eq!(goal.minute, "");
    }

    #[test]
    fn test_away_flag_follows_leader() {
        // Home side scored but away still leads: flag says away
        let goal = parse("Fulham [1]-2 Brentford - Aleksandar Mitrovic 70'");
        assert!(goal.away);

        // Away side scored the equaliser: flag says home
        let goal = parse("Fulham 1-[1] Brentford - Ivan Toney 80'");
        assert!(!goal.away);

        assert!(parse("Cheltenham 0-[2] Notts County - Gabriel 27'").away);
    }

    #[test]
    fn test_rejects_non_goal_titles() {
        for title in [
            "What a fantastic goal by Henry",
            "Top 10 goals - 2023 edition",
            "Arsenal 1-0",
            "",
            "Arsenal vs Chelsea - Match Thread",
        ] {
            let err = parse_goal_title(title, URL).unwrap_err();
            assert_eq!(err, ParseError::NotAGoalTitle { title: title.to_string() });
        }
    }

    #[test]
    fn test_score_overflow_rejected() {
        let err = parse_goal_title("A 99999999999-0 B - C 1'", URL).unwrap_err();
        assert!(matches!(err, ParseError::ScoreOutOfRange { .. }));
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  A \u{2014}\tB  "), "A - B");
    }
}
