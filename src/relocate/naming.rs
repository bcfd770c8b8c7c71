//! Unique name generation inside a target folder.
//!
//! Candidates are probed in order: the name itself, `base_01.ext` up to
//! `base_99.ext`, then a single `base_<6 hex>.ext` random candidate. A name
//! counts as taken when a file *or* a folder of that name exists.

use std::cell::RefCell;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::errors::{RelocationError, Result};
use crate::resource::FolderHandle;

const MAX_COUNTER: u32 = 99;
const RANDOM_SPACE: u32 = 0x100_0000;

#[derive(Debug)]
pub struct NameResolver {
    rng: RefCell<StdRng>,
    check_uniqueness: bool,
}

impl Default for NameResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl NameResolver {
    pub fn new() -> Self {
        Self {
            rng: RefCell::new(StdRng::from_entropy()),
            check_uniqueness: true,
        }
    }

    /// Deterministic random fallback.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
            check_uniqueness: true,
        }
    }

    /// Return candidates as-is without probing the folder.
    pub fn without_uniqueness_check(mut self) -> Self {
        self.check_uniqueness = false;
        self
    }

    pub fn resolve(&self, folder: &FolderHandle, candidate: &str) -> Result<String> {
        if !self.check_uniqueness || !folder.has_entry(candidate)? {
            return Ok(candidate.to_string());
        }

        let (body, ext) = split_extension(candidate);
        let base = strip_counter(body);
        for n in 1..=MAX_COUNTER {
            let name = compose(base, &format!("{n:02}"), ext);
            trace!(folder = %folder.identifier(), candidate = %name, "probing name");
            if !folder.has_entry(&name)? {
                return Ok(name);
            }
        }

        let suffix = self.rng.borrow_mut().gen_range(0..RANDOM_SPACE);
        let name = compose(base, &format!("{suffix:06x}"), ext);
        trace!(folder = %folder.identifier(), candidate = %name, "probing random name");
        if folder.has_entry(&name)? {
            return Err(RelocationError::NamespaceExhausted {
                folder: folder.identifier(),
                last_candidate: name,
            });
        }
        Ok(name)
    }
}

/// Split at the last dot. A leading dot belongs to the body (`.env` has no extension).
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

/// Drop a trailing `_NN` counter so `a_03` probes as `a_01`, `a_02`, ...
fn strip_counter(body: &str) -> &str {
    let bytes = body.as_bytes();
    let n = bytes.len();
    if n > 3 && bytes[n - 3] == b'_' && bytes[n - 2].is_ascii_digit() && bytes[n - 1].is_ascii_digit() {
        &body[..n - 3]
    } else {
        body
    }
}

fn compose(base: &str, suffix: &str, ext: Option<&str>) -> String {
    match ext {
        Some(ext) => format!("{base}_{suffix}.{ext}"),
        None => format!("{base}_{suffix}"),
    }
}
