//! Content model linearization.
//!
//! Folds a [`ContentModel`] tree back into the grammar string of an
//! element declaration: `EMPTY`, `ANY`, `(#PCDATA|a|b)*`, `(a,(b|c)+)?`.

use crate::sax::ContentModel;

/// Flattens a declaration's top-level content model.
///
/// Returns a description of the offending node when the tree has a shape
/// no declaration can produce (a bare name at the top, `EMPTY` nested in a
/// group, a non-name inside a mixed model).
pub(crate) fn flatten(model: &ContentModel) -> Result<String, String> {
    match model {
        ContentModel::Empty => Ok("EMPTY".to_string()),
        ContentModel::Any => Ok("ANY".to_string()),
        ContentModel::Mixed {
            children,
            occurrence,
        } => {
            let mut out = String::from("(#PCDATA");
            for child in children {
                let ContentModel::Name { name, .. } = child else {
                    return Err(format!("mixed content child {}", describe(child)));
                };
                out.push('|');
                out.push_str(name);
            }
            out.push(')');
            out.push_str(occurrence.as_str());
            Ok(out)
        }
        ContentModel::Seq { .. } | ContentModel::Choice { .. } => {
            let mut out = String::new();
            group(model, &mut out)?;
            Ok(out)
        }
        ContentModel::Name { .. } => Err(format!("element decl bad child {}", describe(model))),
    }
}

fn group(model: &ContentModel, out: &mut String) -> Result<(), String> {
    let (children, occurrence, separator) = match model {
        ContentModel::Seq {
            children,
            occurrence,
        } => (children, occurrence, ','),
        ContentModel::Choice {
            children,
            occurrence,
        } => (children, occurrence, '|'),
        other => return Err(format!("element decl bad child {}", describe(other))),
    };
    out.push('(');
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            out.push(separator);
        }
        particle(child, out)?;
    }
    out.push(')');
    out.push_str(occurrence.as_str());
    Ok(())
}

fn particle(model: &ContentModel, out: &mut String) -> Result<(), String> {
    match model {
        ContentModel::Name { name, occurrence } => {
            out.push_str(name);
            out.push_str(occurrence.as_str());
            Ok(())
        }
        other => group(other, out),
    }
}

fn describe(model: &ContentModel) -> String {
    match model {
        ContentModel::Empty => "EMPTY".to_string(),
        ContentModel::Any => "ANY".to_string(),
        ContentModel::Mixed { .. } => "MIXED".to_string(),
        ContentModel::Name { name, .. } => format!("NAME '{name}'"),
        ContentModel::Choice { .. } => "CHOICE".to_string(),
        ContentModel::Seq { .. } => "SEQ".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::sax::Occurrence;
    use pretty_assertions::assert_eq;

    fn name(n: &str, occurrence: Occurrence) -> ContentModel {
        ContentModel::Name {
            name: n.to_string(),
            occurrence,
        }
    }

    #[test]
    fn test_flatten_keywords_and_mixed() {
        assert_eq!(flatten(&ContentModel::Empty).unwrap(), "EMPTY");
        assert_eq!(flatten(&ContentModel::Any).unwrap(), "ANY");
        let pcdata = ContentModel::Mixed {
            children: vec![],
            occurrence: Occurrence::Once,
        };
        assert_eq!(flatten(&pcdata).unwrap(), "(#PCDATA)");
        let mixed = ContentModel::Mixed {
            children: vec![name("a", Occurrence::Once), name("b", Occurrence::Once)],
            occurrence: Occurrence::ZeroOrMore,
        };
        assert_eq!(flatten(&mixed).unwrap(), "(#PCDATA|a|b)*");
    }

    #[test]
    fn test_flatten_nested_groups() {
        let model = ContentModel::Seq {
            children: vec![
                name("to", Occurrence::Once),
                ContentModel::Choice {
                    children: vec![name("cc", Occurrence::OneOrMore), name("bcc", Occurrence::Once)],
                    occurrence: Occurrence::ZeroOrMore,
                },
                name("body", Occurrence::Optional),
            ],
            occurrence: Occurrence::OneOrMore,
        };
        assert_eq!(flatten(&model).unwrap(), "(to,(cc+|bcc)*,body?)+");
    }

    #[test]
    fn test_flatten_rejects_impossible_shapes() {
        assert!(flatten(&name("a", Occurrence::Once)).is_err());
        let nested_empty = ContentModel::Seq {
            children: vec![ContentModel::Empty],
            occurrence: Occurrence::Once,
        };
        assert_eq!(
            flatten(&nested_empty).unwrap_err(),
            "element decl bad child EMPTY"
        );
        let mixed_group = ContentModel::Mixed {
            children: vec![ContentModel::Any],
            occurrence: Occurrence::ZeroOrMore,
        };
        assert!(flatten(&mixed_group).is_err());
    }
}
