//! Isolation Checker: static verification that concepts stay decoupled.
//!
//! A concept's implementation must have zero reachable reference to another
//! concept — no imports of its module, no use of its types, no mention of
//! its collection namespace. Anything that must flow between concepts is an
//! opaque Identifier. This pass runs at build/compose time over the source
//! tree; a violation is a build failure, never a runtime one.
//!
//! Checks per concept module under `src/concepts/`:
//! - no `crate::concepts::<other>` path anywhere (imports or inline paths)
//! - no string literal naming another concept's `{ConceptName}.` namespace
//! - every module file is on the roster, so the surface stays enumerable

use crate::core::error::AtollError;
use regex::Regex;
use rustc_hash::FxHashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Violation {
    pub file: PathBuf,
    pub concept: String,
    pub detail: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.file.display(), self.concept, self.detail)
    }
}

/// Scan every concept module under `<src_root>/concepts/` against the
/// roster of (module file stem, concept name) pairs. Returns all violations
/// found; empty means the tree is clean.
pub fn check_isolation(
    src_root: &Path,
    roster: &[(&str, &str)],
) -> Result<Vec<Violation>, AtollError> {
    let concepts_dir = src_root.join("concepts");
    let mut violations = Vec::new();

    let rostered: FxHashSet<&str> = roster.iter().map(|(module, _)| *module).collect();
    for entry in fs::read_dir(&concepts_dir).map_err(AtollError::IoError)? {
        let entry = entry.map_err(AtollError::IoError)?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("rs") {
            continue;
        }
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        if stem == "mod" {
            continue;
        }
        if !rostered.contains(stem) {
            violations.push(Violation {
                file: path.clone(),
                concept: stem.to_string(),
                detail: "concept module is not on the roster; its surface cannot be verified"
                    .to_string(),
            });
        }
    }

    for (module, concept_name) in roster {
        let path = concepts_dir.join(format!("{}.rs", module));
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => return Err(AtollError::IoError(e)),
        };

        for (other_module, other_name) in roster {
            if other_module == module {
                continue;
            }
            let module_ref = Regex::new(&format!(r"crate::concepts::{}\b", other_module))
                .map_err(|e| AtollError::InvariantViolation(e.to_string()))?;
            if module_ref.is_match(&content) {
                violations.push(Violation {
                    file: path.clone(),
                    concept: concept_name.to_string(),
                    detail: format!("references module crate::concepts::{}", other_module),
                });
            }
            let namespace_ref = Regex::new(&format!(r#""{}\."#, other_name))
                .map_err(|e| AtollError::InvariantViolation(e.to_string()))?;
            if namespace_ref.is_match(&content) {
                violations.push(Violation {
                    file: path.clone(),
                    concept: concept_name.to_string(),
                    detail: format!("names foreign collection namespace '{}.'", other_name),
                });
            }
        }
    }

    Ok(violations)
}

/// CLI surface: print each violation and report the verdict.
pub fn run_check(src_root: &Path, roster: &[(&str, &str)]) -> Result<bool, AtollError> {
    let violations = check_isolation(src_root, roster)?;
    if violations.is_empty() {
        println!("Isolation Gate: PASS ({} concept(s) verified)", roster.len());
        Ok(true)
    } else {
        for v in &violations {
            println!("FAIL: {}", v);
        }
        println!("Isolation Gate: {} violation(s)", violations.len());
        Ok(false)
    }
}
