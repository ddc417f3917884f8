//! Graph validation: structural integrity of a declared stack before serialization.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::SynthError;
use crate::stack::Stack;

pub(crate) fn validate(stack: &Stack) -> Result<(), SynthError> {
    let ids: HashSet<&str> = stack.resources().iter().map(|(id, _)| id.as_str()).collect();

    for (_, resource) in stack.resources() {
        for dep in &resource.depends_on {
            if !ids.contains(dep.as_str()) {
                return Err(SynthError::DanglingReference {
                    kind: "depends_on",
                    id: dep.as_str().to_string(),
                });
            }
        }
        check_refs(&resource.properties, &ids)?;
    }

    // One (verb, path) pair per API, and authorizers must be declared on the
    // same API they guard.
    let mut seen = HashSet::new();
    for m in stack.methods() {
        if !seen.insert((m.api.as_str(), m.verb.clone(), m.path.clone())) {
            return Err(SynthError::DuplicateMethod {
                verb: m.verb.clone(),
                path: m.path.clone(),
            });
        }
        if let Some(authorizer) = &m.authorizer {
            let declared = stack
                .authorizers()
                .iter()
                .any(|(api, a)| api == &m.api && a == authorizer);
            if !declared {
                return Err(SynthError::DanglingReference {
                    kind: "authorizer",
                    id: authorizer.as_str().to_string(),
                });
            }
        }
    }

    for part in stack.doc_parts() {
        let matched = stack
            .methods()
            .iter()
            .any(|m| m.api == part.api && m.verb == part.verb && m.path == part.path);
        if !matched {
            return Err(SynthError::DocumentationMismatch {
                verb: part.verb.clone(),
                path: part.path.clone(),
            });
        }
    }

    Ok(())
}

/// Walk a property document; every `Ref` / `Fn::GetAtt` target must be a
/// declared logical id. `AWS::*` pseudo-parameters are engine-provided.
fn check_refs(value: &Value, ids: &HashSet<&str>) -> Result<(), SynthError> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(target)) = map.get("Ref") {
                if !target.starts_with("AWS::") && !ids.contains(target.as_str()) {
                    return Err(SynthError::DanglingReference {
                        kind: "ref",
                        id: target.clone(),
                    });
                }
            }
            if let Some(Value::Array(args)) = map.get("Fn::GetAtt") {
                if let Some(Value::String(target)) = args.first() {
                    if !ids.contains(target.as_str()) {
                        return Err(SynthError::DanglingReference {
                            kind: "get_att",
                            id: target.clone(),
                        });
                    }
                }
            }
            for v in map.values() {
                check_refs(v, ids)?;
            }
        }
        Value::Array(items) => {
            for v in items {
                check_refs(v, ids)?;
            }
        }
        _ => {}
    }
    Ok(())
}
