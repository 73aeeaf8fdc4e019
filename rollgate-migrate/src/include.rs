//! Include directive expansion.
//!
//! Change-set files may splice in shared SQL fragments with a comment
//! directive:
//!
//! ```sql
//! -- INCLUDE @shared/migration_log.sql
//! ```
//!
//! The directive line is replaced by the referenced file's contents, framed
//! by `-- INCLUDED FROM:` / `-- END INCLUDE:` markers so the executed SQL
//! stays traceable. Expansion is a single pass: a directive inside an
//! included file is spliced through verbatim, not expanded again.

use std::path::PathBuf;

use regex_lite::Regex;
use tracing::debug;

use crate::error::{MigrateResult, MigrationError};

/// Line pattern for an include directive. Matched against the trimmed line so
/// Windows line endings and stray indentation don't hide a directive.
const DIRECTIVE_PATTERN: &str = r"(?i)^--\s*INCLUDE\s+@(.+)$";

/// Expands `INCLUDE` directives against a fixed root directory.
pub struct IncludePreprocessor {
    root: PathBuf,
    directive: Regex,
}

impl IncludePreprocessor {
    /// Create a preprocessor resolving directive paths under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            // The pattern is a literal; it cannot fail to compile.
            directive: Regex::new(DIRECTIVE_PATTERN).unwrap(),
        }
    }

    /// Expand every directive line in `sql`, leaving all other lines intact.
    ///
    /// Fails with [`MigrationError::IncludeNotFound`] when a referenced file
    /// cannot be read; the caller treats that like any other change-set
    /// failure.
    pub async fn expand(&self, sql: &str) -> MigrateResult<String> {
        let mut out = Vec::new();

        for line in sql.lines() {
            match self.directive.captures(line.trim()) {
                Some(caps) => {
                    let include_path = caps[1].to_string();
                    let full_path = self.root.join(&include_path);

                    let content = tokio::fs::read_to_string(&full_path)
                        .await
                        .map_err(|_| MigrationError::include_not_found(&include_path))?;

                    debug!(path = %include_path, "including fragment");
                    out.push(format!("-- INCLUDED FROM: {}", include_path));
                    out.push(content);
                    out.push(format!("-- END INCLUDE: {}", include_path));
                }
                None => out.push(line.to_string()),
            }
        }

        Ok(out.join("\n"))
    }
}
