//! Text save and restore of region models.
//!
//! Each model is written as
//!
//! ```text
//! begin_edge_model "EdgeLength"
//! BUILTIN
//! end_edge_model
//! ```
//!
//! with one of five bodies: `BUILTIN`, `UNIFORM <value>`, `DATA` followed by
//! one value per line, `DATAPARENT "<parent>"`, or
//! `COMMAND <name> -option "value" ...`. Restoring recreates data models
//! first, since commands may check that the node models they read exist,
//! then built-in and command models, then sub-models that were not already
//! recreated as companions.

use std::fmt;

use crate::geom_models::create::{Command, create_builtin_model, execute_command};
use crate::model::kind::ElementKind;
use crate::model::sub_model::SubModel;
use crate::model::{
    EdgeKind, ModelHandle, ModelKind, NodeKind, Severity, TetrahedronEdgeKind, TriangleEdgeKind,
};
use crate::model_error::ModelError;
use crate::region::Region;

impl<K: ElementKind> ModelHandle<'_, K> {
    /// Writes this model in the saved model format.
    pub fn serialize(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        let keyword = K::KIND.keyword();
        writeln!(out, "begin_{keyword}_model \"{}\"", self.name())?;
        self.model().calculation().serialize(self, out)?;
        write!(out, "\nend_{keyword}_model\n\n")
    }
}

fn serialize_kind<K: ElementKind>(region: &Region, out: &mut dyn fmt::Write) -> fmt::Result {
    for model in K::registry(region).snapshot() {
        ModelHandle::new(region, model).serialize(out)?;
    }
    Ok(())
}

/// Body of one saved model.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelBody {
    Builtin,
    Uniform(f64),
    Data(Vec<f64>),
    DataParent(String),
    Command(Command),
}

/// One `begin_... end_...` block.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedModel {
    pub kind: ModelKind,
    pub name: String,
    pub body: ModelBody,
    /// Line of the `begin_` header.
    pub line: usize,
}

impl Region {
    /// Writes every model of the region, node models first, names sorted
    /// within each kind.
    pub fn serialize_models(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        serialize_kind::<NodeKind>(self, out)?;
        serialize_kind::<EdgeKind>(self, out)?;
        serialize_kind::<TriangleEdgeKind>(self, out)?;
        serialize_kind::<TetrahedronEdgeKind>(self, out)
    }

    /// Recreates the models in `text`, written by
    /// [`serialize_models`](Self::serialize_models).
    ///
    /// # Errors
    /// [`ModelError::Parse`] for malformed input; otherwise whatever the
    /// creation commands report. Models restored before the error are kept.
    pub fn restore_models(&self, text: &str) -> Result<(), ModelError> {
        let saved = parse_models(text)?;
        log::debug!("restoring {} models on {}", saved.len(), self.location());

        for model in &saved {
            if matches!(model.body, ModelBody::Uniform(_) | ModelBody::Data(_)) {
                match model.kind {
                    ModelKind::Node => restore_data::<NodeKind>(self, model)?,
                    ModelKind::Edge => restore_data::<EdgeKind>(self, model)?,
                    ModelKind::TriangleEdge => restore_data::<TriangleEdgeKind>(self, model)?,
                    ModelKind::TetrahedronEdge => restore_data::<TetrahedronEdgeKind>(self, model)?,
                }
            }
        }
        for model in &saved {
            match &model.body {
                ModelBody::Builtin => {
                    if !create_builtin_model(self, model.kind, &model.name)? {
                        let err = ModelError::UnknownModel {
                            location: self.location(),
                            kind: model.kind,
                            model: model.name.clone(),
                        };
                        self.report(Severity::Error, err.to_string());
                        return Err(err);
                    }
                }
                ModelBody::Command(command) => execute_command(self, command)?,
                _ => {}
            }
        }
        for model in &saved {
            if let ModelBody::DataParent(parent) = &model.body {
                match model.kind {
                    ModelKind::Node => restore_sub_model::<NodeKind>(self, &model.name, parent)?,
                    ModelKind::Edge => restore_sub_model::<EdgeKind>(self, &model.name, parent)?,
                    ModelKind::TriangleEdge => {
                        restore_sub_model::<TriangleEdgeKind>(self, &model.name, parent)?
                    }
                    ModelKind::TetrahedronEdge => {
                        restore_sub_model::<TetrahedronEdgeKind>(self, &model.name, parent)?
                    }
                }
            }
        }
        Ok(())
    }
}

fn restore_data<K: ElementKind>(region: &Region, saved: &SavedModel) -> Result<(), ModelError> {
    let handle = region.add_model::<K, _>(&saved.name, SubModel::data())?;
    match &saved.body {
        ModelBody::Uniform(v) => handle.set_uniform_value(*v),
        ModelBody::Data(values) => handle.set_values(values.clone()),
        _ => Ok(()),
    }
}

/// Companions usually exist already because their parent was restored.
fn restore_sub_model<K: ElementKind>(region: &Region, name: &str, parent: &str) -> Result<(), ModelError> {
    if region.get_model::<K>(name).is_none() {
        region.add_model::<K, _>(name, SubModel::with_parent(parent))?;
    }
    Ok(())
}

fn parse_error(line: usize, reason: impl Into<String>) -> ModelError {
    ModelError::Parse {
        line,
        reason: reason.into(),
    }
}

/// Splits a line into words; double-quoted words may contain spaces.
fn tokenize(text: &str, line: usize) -> Result<Vec<String>, ModelError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '"' {
            chars.next();
            let mut word = String::new();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some(ch) => word.push(ch),
                    None => return Err(parse_error(line, "unterminated quoted string")),
                }
            }
            tokens.push(word);
        } else {
            let mut word = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                word.push(ch);
                chars.next();
            }
            tokens.push(word);
        }
    }
    Ok(tokens)
}

fn parse_command(tokens: &[String], line: usize) -> Result<Command, ModelError> {
    let Some(name) = tokens.first() else {
        return Err(parse_error(line, "COMMAND without a command name"));
    };
    let mut command = Command::new(name.as_str());
    let mut rest = tokens[1..].iter();
    while let Some(flag) = rest.next() {
        let Some(key) = flag.strip_prefix('-') else {
            return Err(parse_error(line, format!("expected an option, found \"{flag}\"")));
        };
        let Some(value) = rest.next() else {
            return Err(parse_error(line, format!("option -{key} has no value")));
        };
        command.options.insert(key.to_string(), value.clone());
    }
    Ok(command)
}

fn parse_number(text: &str, line: usize) -> Result<f64, ModelError> {
    text.trim()
        .parse()
        .map_err(|_| parse_error(line, format!("\"{}\" is not a number", text.trim())))
}

/// Parses saved model text into blocks without touching any region.
pub fn parse_models(text: &str) -> Result<Vec<SavedModel>, ModelError> {
    let mut saved = Vec::new();
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    while let Some((line, header)) = lines.next() {
        let tokens = tokenize(header, line)?;
        let (kind, name) = match tokens.as_slice() {
            [begin, name] => {
                let kind = begin
                    .strip_prefix("begin_")
                    .and_then(|s| s.strip_suffix("_model"))
                    .and_then(ModelKind::from_keyword)
                    .ok_or_else(|| parse_error(line, format!("expected begin_<kind>_model, found \"{begin}\"")))?;
                (kind, name.clone())
            }
            _ => return Err(parse_error(line, format!("expected model header, found \"{header}\""))),
        };
        let end = format!("end_{}_model", kind.keyword());

        let (body_line, body) = lines
            .next()
            .ok_or_else(|| parse_error(line, format!("model \"{name}\" has no body")))?;
        let body_tokens = tokenize(body, body_line)?;
        let mut data = None;
        let body = match body_tokens.as_slice() {
            [w] if w == "BUILTIN" => ModelBody::Builtin,
            [w, v] if w == "UNIFORM" => ModelBody::Uniform(parse_number(v, body_line)?),
            [w] if w == "DATA" => {
                data = Some(Vec::new());
                ModelBody::Data(Vec::new())
            }
            [w, parent] if w == "DATAPARENT" => ModelBody::DataParent(parent.clone()),
            [w, rest @ ..] if w == "COMMAND" => ModelBody::Command(parse_command(rest, body_line)?),
            _ => return Err(parse_error(body_line, format!("unrecognized model body \"{body}\""))),
        };

        loop {
            let Some((l, text)) = lines.next() else {
                return Err(parse_error(line, format!("model \"{name}\" is missing {end}")));
            };
            if text == end {
                break;
            }
            match data.as_mut() {
                Some(values) => values.push(parse_number(text, l)?),
                None => return Err(parse_error(l, format!("expected {end}, found \"{text}\""))),
            }
        }

        saved.push(SavedModel {
            kind,
            name,
            body: match data {
                Some(values) => ModelBody::Data(values),
                None => body,
            },
            line,
        });
    }
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_body_form() {
        let text = "begin_node_model \"x\"\nBUILTIN\nend_node_model\n\n\
                    begin_node_model \"N\"\nUNIFORM 2.5\nend_node_model\n\n\
                    begin_edge_model \"E\"\nDATA\n1\n-0.5\nend_edge_model\n\n\
                    begin_node_model \"y\"\nDATAPARENT \"x\"\nend_node_model\n\n\
                    begin_edge_model \"Eavg\"\nCOMMAND edge_average_model -device \"d\" -region \"r\" -node_model \"N\" -edge_model \"Eavg\" -average_type \"arithmetic\"\nend_edge_model\n";
        let saved = parse_models(text).unwrap();
        assert_eq!(saved.len(), 5);
        assert_eq!(saved[0].body, ModelBody::Builtin);
        assert_eq!(saved[1].body, ModelBody::Uniform(2.5));
        assert_eq!(saved[2].kind, ModelKind::Edge);
        assert_eq!(saved[2].body, ModelBody::Data(vec![1.0, -0.5]));
        assert_eq!(saved[3].body, ModelBody::DataParent("x".into()));
        let ModelBody::Command(command) = &saved[4].body else {
            panic!("expected a command body");
        };
        assert_eq!(command.name, "edge_average_model");
        assert_eq!(command.get("node_model"), Some("N"));
        assert_eq!(saved[4].line, 19);
    }

    #[test]
    fn reports_line_of_bad_value() {
        let text = "begin_edge_model \"E\"\nDATA\n1\nabc\nend_edge_model\n";
        assert!(matches!(parse_models(text), Err(ModelError::Parse { line: 4, .. })));
    }

    #[test]
    fn rejects_mismatched_end() {
        let text = "begin_edge_model \"E\"\nBUILTIN\nend_node_model\n";
        assert!(matches!(parse_models(text), Err(ModelError::Parse { line: 3, .. })));
    }

    #[test]
    fn quoted_words_keep_spaces() {
        let tokens = tokenize("COMMAND c -device \"my device\"", 1).unwrap();
        assert_eq!(tokens, ["COMMAND", "c", "-device", "my device"]);
        assert!(tokenize("\"open", 7).is_err());
    }
}
