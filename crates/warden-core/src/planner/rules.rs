//! Rule-based planner
//!
//! A deterministic keyword matcher over the last user message:
//! - `read [path|file] X`, `show X`, `open X`, `cat X` propose `file_read`
//! - `run|exec|execute CMD ARGS...` propose `command_exec`; a bare command
//!   name maps to `/bin/<name>`
//! - `find|search|list ...` propose `file_search`, with optional
//!   `named|matching|containing|called Q`, `modified after|since D` and
//!   `modified before|until D`
//!
//! Clauses joined by `then` become separate actions in order. A month-name
//! date without a year, or anything unrecognised, produces a question.

use super::Planner;
use crate::error::Result;
use crate::model::{AgentPlan, ChatMessage, ProposedAction, Role};
use chrono::NaiveDate;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;
use tracing::debug;
use warden_policy::{ToolCall, TOOL_COMMAND_EXEC, TOOL_FILE_READ, TOOL_FILE_SEARCH};

static CLAUSE_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(?:,\s*)?(?:\band\s+)?\bthen\b\s*")
        .expect("CLAUSE_SPLIT is a compile-time constant")
});

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}(?:T[0-9:]+(?:Z|[+-]\d{2}:\d{2})?)?$")
        .expect("ISO_DATE is a compile-time constant")
});

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const HELP_QUESTION: &str = "I can read a file (\"read README.md\"), search files \
(\"find files named report\") or run an allowlisted command (\"run ls -la\"). \
What would you like to do?";

/// Outcome of interpreting one clause
enum Interpretation {
    Action(ProposedAction),
    Question(String),
}

/// Deterministic keyword planner
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedPlanner;

impl RuleBasedPlanner {
    /// Create a new rule-based planner
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Plan from a single message
    #[must_use]
    pub fn plan_text(&self, text: &str) -> AgentPlan {
        let clauses: Vec<&str> = CLAUSE_SPLIT
            .split(text.trim())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        if clauses.is_empty() {
            return AgentPlan::clarify(HELP_QUESTION);
        }

        let mut actions = Vec::new();
        let mut questions = Vec::new();
        for clause in &clauses {
            match interpret(clause) {
                Interpretation::Action(action) => actions.push(action),
                Interpretation::Question(question) => questions.push(question),
            }
        }

        if !questions.is_empty() {
            return AgentPlan {
                summary: "Need clarification before acting".to_string(),
                questions,
                actions: Vec::new(),
            };
        }

        let summary = match actions.as_slice() {
            [single] => single.title.clone(),
            _ => format!("{} steps", actions.len()),
        };
        AgentPlan {
            summary,
            questions: Vec::new(),
            actions,
        }
    }
}

#[async_trait::async_trait]
impl Planner for RuleBasedPlanner {
    async fn plan(&self, history: &[ChatMessage]) -> Result<AgentPlan> {
        let Some(last) = history.iter().rev().find(|m| m.role == Role::User) else {
            return Ok(AgentPlan::clarify(HELP_QUESTION));
        };
        let plan = self.plan_text(&last.text);
        debug!(
            actions = plan.actions.len(),
            questions = plan.questions.len(),
            "Rule-based plan"
        );
        Ok(plan)
    }

    fn name(&self) -> &str {
        "rules"
    }
}

fn interpret(clause: &str) -> Interpretation {
    let tokens: Vec<&str> = clause.split_whitespace().collect();
    let Some((verb, rest)) = tokens.split_first() else {
        return Interpretation::Question(HELP_QUESTION.to_string());
    };

    match verb.to_lowercase().as_str() {
        "read" | "show" | "open" | "cat" => read_action(clause, rest),
        "run" | "exec" | "execute" => exec_action(clause, rest),
        "find" | "search" | "list" => search_action(clause, rest),
        _ => Interpretation::Question(HELP_QUESTION.to_string()),
    }
}

fn strip_quotes(s: &str) -> &str {
    s.trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

fn read_action(clause: &str, rest: &[&str]) -> Interpretation {
    let rest = match rest.first().map(|t| t.to_lowercase()) {
        Some(word) if word == "path" || word == "file" || word == "the" => &rest[1..],
        _ => rest,
    };
    let rest = match rest.first().map(|t| t.to_lowercase()) {
        Some(word) if word == "file" || word == "path" => &rest[1..],
        _ => rest,
    };
    let path = strip_quotes(&rest.join(" ")).to_string();
    if path.is_empty() {
        return Interpretation::Question("Which file should I read?".to_string());
    }

    Interpretation::Action(ProposedAction::new(
        format!("Read {}", path),
        format!("Requested by the user: \"{}\"", clause),
        ToolCall::new(TOOL_FILE_READ, json!({ "path": path })),
    ))
}

fn exec_action(clause: &str, rest: &[&str]) -> Interpretation {
    let Some((command, args)) = rest.split_first() else {
        return Interpretation::Question("Which command should I run?".to_string());
    };
    let command = strip_quotes(command);
    let executable = if command.starts_with('/') {
        command.to_string()
    } else if command.contains('/') {
        return Interpretation::Question(format!(
            "Please give the absolute path of '{}'.",
            command
        ));
    } else {
        format!("/bin/{}", command)
    };
    let args: Vec<String> = args.iter().map(|a| strip_quotes(a).to_string()).collect();

    let title = if args.is_empty() {
        format!("Run {}", executable)
    } else {
        format!("Run {} {}", executable, args.join(" "))
    };
    Interpretation::Action(ProposedAction::new(
        title,
        format!("Requested by the user: \"{}\"", clause),
        ToolCall::new(
            TOOL_COMMAND_EXEC,
            json!({ "executablePath": executable, "args": args }),
        ),
    ))
}

/// Parse a date starting at `tokens[0]`.
///
/// Returns the ISO date, or a question when the date cannot be pinned down.
fn parse_date(tokens: &[&str]) -> std::result::Result<String, String> {
    let Some(first) = tokens.first() else {
        return Err("Which date do you mean?".to_string());
    };
    let first = first.trim_end_matches([',', '.']);
    if ISO_DATE.is_match(first) {
        return Ok(first.to_string());
    }

    let lower = first.to_lowercase();
    let Some(month) = MONTHS
        .iter()
        .position(|m| *m == lower || (lower.len() >= 3 && m.starts_with(lower.as_str())))
    else {
        return Err(format!("I couldn't understand the date '{}'.", first));
    };

    let day = tokens
        .get(1)
        .map(|t| {
            t.trim_end_matches([',', '.'])
                .trim_end_matches("st")
                .trim_end_matches("nd")
                .trim_end_matches("rd")
                .trim_end_matches("th")
        })
        .and_then(|t| t.parse::<u32>().ok());
    let Some(day) = day else {
        return Err(format!("Which day of {} do you mean?", MONTHS[month]));
    };

    let year = tokens
        .get(2)
        .map(|t| t.trim_end_matches([',', '.']))
        .filter(|t| t.len() == 4)
        .and_then(|t| t.parse::<i32>().ok());
    let Some(year) = year else {
        return Err(format!(
            "Which year do you mean for {} {}?",
            capitalize(MONTHS[month]),
            day
        ));
    };

    let month_number = u32::try_from(month + 1).unwrap_or(1);
    match NaiveDate::from_ymd_opt(year, month_number, day) {
        Some(date) => Ok(date.format("%Y-%m-%d").to_string()),
        None => Err(format!("{} {} {} is not a valid date.", MONTHS[month], day, year)),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn search_action(clause: &str, rest: &[&str]) -> Interpretation {
    let mut arguments = Map::new();
    let mut index = 0;

    while index < rest.len() {
        let word = rest[index].to_lowercase();
        match word.as_str() {
            "named" | "matching" | "containing" | "called" => {
                if let Some(query) = rest.get(index + 1) {
                    arguments.insert("query".to_string(), Value::from(strip_quotes(query)));
                    index += 2;
                    continue;
                }
                return Interpretation::Question("What should the file names match?".to_string());
            }
            "after" | "since" | "before" | "until" => {
                let key = if word == "after" || word == "since" {
                    "modifiedAfter"
                } else {
                    "modifiedBefore"
                };
                match parse_date(&rest[index + 1..]) {
                    Ok(date) => {
                        arguments.insert(key.to_string(), Value::from(date));
                    }
                    Err(question) => return Interpretation::Question(question),
                }
            }
            _ => {}
        }
        index += 1;
    }

    Interpretation::Action(ProposedAction::new(
        "Search files",
        format!("Requested by the user: \"{}\"", clause),
        ToolCall::new(TOOL_FILE_SEARCH, Value::Object(arguments)),
    ))
}
