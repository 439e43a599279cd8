//! Turns stored credential files into [`Auth`](crate::auth::Auth) records.

mod exclusion;
mod file;
mod gemini_virtual;

pub use exclusion::{ModelExclusionHook, NoopExclusionHook};
pub use file::FileSynthesizer;
pub use gemini_virtual::{build_virtual_id, split_project_ids, synthesize_gemini_virtual_auths};

use crate::config::Config;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Inputs for one synthesis pass.
#[derive(Debug, Clone)]
pub struct SynthesisContext<'a> {
    pub auth_dir: PathBuf,
    pub config: &'a Config,
    pub now: DateTime<Utc>,
}

impl<'a> SynthesisContext<'a> {
    pub fn new(auth_dir: impl Into<PathBuf>, config: &'a Config, now: DateTime<Utc>) -> Self {
        Self {
            auth_dir: auth_dir.into(),
            config,
            now,
        }
    }
}
