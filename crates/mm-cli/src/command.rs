//! Shell command grammar.
//!
//! One command per line. Names run to the end of the line, so they may
//! contain spaces; JSON payloads likewise take the rest of the line.

use mm_core::{EdgeId, EdgePatch, NodeId, NodeKind};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum AutoSaveArg {
    On,
    Off,
    Interval(u64),
    Status,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    New(String),
    Open(String),
    Save,
    Delete(String),
    List,
    Add(NodeKind, Option<Value>),
    Remove(NodeId),
    Move(NodeId, f64, f64),
    Set(NodeId, Value),
    Connect(NodeId, NodeId),
    Edge(EdgeId, EdgePatch),
    Unlink(EdgeId),
    Copy(NodeId),
    Paste(Option<NodeId>),
    Duplicate(NodeId),
    Undo,
    Redo,
    Show,
    Export(Option<PathBuf>),
    Import(PathBuf),
    AutoSave(AutoSaveArg),
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  new NAME | open NAME | save | delete NAME | list
  add TYPE [JSON] | rm ID | move ID X Y | set ID JSON
  connect SRC TGT | edge ID JSON | unlink ID
  copy ID | paste [TARGET] | dup ID
  undo | redo | show
  export [DIR] | import FILE
  autosave on|off|interval MS|status
  help | quit";

/// Parse one input line. Blank lines parse to `None`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let cmd = match verb {
        "new" => Command::New(name(rest)?),
        "open" | "load" => Command::Open(name(rest)?),
        "save" => Command::Save,
        "delete" => Command::Delete(name(rest)?),
        "list" | "ls" => Command::List,
        "add" => {
            let (kind, payload) = split_word(rest);
            let kind: NodeKind = kind.parse()?;
            let payload = if payload.is_empty() {
                None
            } else {
                Some(json(payload)?)
            };
            Command::Add(kind, payload)
        }
        "rm" => Command::Remove(id(rest)?),
        "move" => {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            let [node, x, y] = parts[..] else {
                return Err("usage: move ID X Y".into());
            };
            Command::Move(id(node)?, number(x)?, number(y)?)
        }
        "set" => {
            let (node, payload) = split_word(rest);
            Command::Set(id(node)?, json(payload)?)
        }
        "connect" => {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            let [source, target] = parts[..] else {
                return Err("usage: connect SRC TGT".into());
            };
            Command::Connect(id(source)?, id(target)?)
        }
        "edge" => {
            let (edge, payload) = split_word(rest);
            let patch: EdgePatch = serde_json::from_value(json(payload)?)
                .map_err(|e| format!("invalid edge style: {e}"))?;
            Command::Edge(id(edge)?, patch)
        }
        "unlink" => Command::Unlink(id(rest)?),
        "copy" => Command::Copy(id(rest)?),
        "paste" => Command::Paste(if rest.is_empty() { None } else { Some(id(rest)?) }),
        "dup" | "duplicate" => Command::Duplicate(id(rest)?),
        "undo" => Command::Undo,
        "redo" => Command::Redo,
        "show" => Command::Show,
        "export" => Command::Export((!rest.is_empty()).then(|| PathBuf::from(rest))),
        "import" => {
            if rest.is_empty() {
                return Err("usage: import FILE".into());
            }
            Command::Import(PathBuf::from(rest))
        }
        "autosave" => Command::AutoSave(auto_save_arg(rest)?),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command `{other}` (try `help`)")),
    };
    Ok(Some(cmd))
}

fn auto_save_arg(rest: &str) -> Result<AutoSaveArg, String> {
    let (word, value) = split_word(rest);
    match word {
        "on" => Ok(AutoSaveArg::On),
        "off" => Ok(AutoSaveArg::Off),
        "" | "status" => Ok(AutoSaveArg::Status),
        "interval" => value
            .parse::<u64>()
            .map(AutoSaveArg::Interval)
            .map_err(|_| format!("invalid interval `{value}`: expected milliseconds")),
        other => Err(format!("unknown autosave option `{other}`")),
    }
}

fn split_word(s: &str) -> (&str, &str) {
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}

fn name(rest: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err("expected a mind map name".into())
    } else {
        Ok(rest.to_string())
    }
}

fn id(s: &str) -> Result<NodeId, String> {
    let s = s.trim().trim_start_matches('#');
    if s.is_empty() || s.contains(char::is_whitespace) {
        Err(format!("invalid id `{s}`"))
    } else {
        Ok(NodeId::intern(s))
    }
}

fn number(s: &str) -> Result<f64, String> {
    s.parse().map_err(|_| format!("invalid number `{s}`"))
}

fn json(s: &str) -> Result<Value, String> {
    if s.is_empty() {
        return Err("expected a JSON object".into());
    }
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_core::ArrowKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ok(line: &str) -> Command {
        parse(line).unwrap().unwrap()
    }

    #[test]
    fn blank_line_is_nothing() {
        assert_eq!(parse("   "), Ok(None));
    }

    #[test]
    fn names_keep_spaces() {
        assert_eq!(ok("new  Physics 101 "), Command::New("Physics 101".into()));
        assert!(parse("open").is_err());
    }

    #[test]
    fn add_with_and_without_payload() {
        assert_eq!(ok("add note"), Command::Add(NodeKind::Note, None));
        assert_eq!(
            ok(r#"add topic {"label": "Forces"}"#),
            Command::Add(NodeKind::Topic, Some(json!({ "label": "Forces" })))
        );
        assert!(parse("add widget").is_err());
    }

    #[test]
    fn ids_accept_hash_prefix() {
        assert_eq!(ok("rm #topic_3"), Command::Remove(NodeId::intern("topic_3")));
    }

    #[test]
    fn move_needs_three_arguments() {
        assert_eq!(
            ok("move a 10 -2.5"),
            Command::Move(NodeId::intern("a"), 10.0, -2.5)
        );
        assert!(parse("move a 10").is_err());
        assert!(parse("move a x y").is_err());
    }

    #[test]
    fn edge_patch_is_parsed() {
        let Command::Edge(id, patch) = ok(r#"edge edge_1 {"arrow": "both", "strokeWidth": 3}"#)
        else {
            panic!("expected edge command");
        };
        assert_eq!(id, NodeId::intern("edge_1"));
        assert_eq!(patch.arrow, Some(ArrowKind::Both));
        assert_eq!(patch.stroke_width, Some(3.0));
    }

    #[test]
    fn autosave_options() {
        assert_eq!(ok("autosave on"), Command::AutoSave(AutoSaveArg::On));
        assert_eq!(
            ok("autosave interval 10000"),
            Command::AutoSave(AutoSaveArg::Interval(10_000))
        );
        assert_eq!(ok("autosave"), Command::AutoSave(AutoSaveArg::Status));
        assert!(parse("autosave interval soon").is_err());
    }

    #[test]
    fn paste_target_is_optional() {
        assert_eq!(ok("paste"), Command::Paste(None));
        assert_eq!(ok("paste root"), Command::Paste(Some(NodeId::intern("root"))));
    }

    #[test]
    fn unknown_verb_is_rejected() {
        assert!(parse("explode").unwrap_err().contains("unknown command"));
    }
}
