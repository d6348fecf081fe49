//! Capability name negotiation
//!
//! Layers and extensions are requested by name and may or may not exist on
//! the machine. The matcher merges a "requested" list against whatever the
//! enumeration sweep actually offers, building the final enabled list
//! handed to instance/device creation. Required names are merged
//! unconditionally; whether a missing required name is fatal is the
//! sequencer's call, not the matcher's.

/// Match one offered capability name against a requested list
///
/// Returns the index of `candidate` in `requested` when it is present and
/// not already enabled, appending it to `enabled` as a side effect.
/// Absence and duplicates are silent.
pub fn match_and_merge(
    candidate: &str,
    enabled: &mut Vec<String>,
    requested: &[String],
) -> Option<usize> {
    let position = requested.iter().position(|name| name == candidate)?;
    if enabled.iter().any(|name| name == candidate) {
        return None;
    }
    enabled.push(candidate.to_owned());
    Some(position)
}

/// Append every required name not already present in `enabled`
///
/// Preserves the order of `required`; applying it twice is a no-op.
pub fn merge_required(enabled: &mut Vec<String>, required: &[String]) {
    for name in required {
        if !enabled.iter().any(|existing| existing == name) {
            enabled.push(name.clone());
        }
    }
}

/// One negotiation round: requested names, required names, and the enabled
/// list built from what the enumeration sweep offered
///
/// The enabled list is duplicate-free and preserves first-seen order.
/// Scoped to a single acquisition attempt.
#[derive(Debug, Clone)]
pub struct NameRequestSet {
    optional: Vec<String>,
    required: Vec<String>,
    available: Vec<String>,
    enabled: Vec<String>,
}

impl NameRequestSet {
    /// Start a negotiation round for the given requested/required names
    pub fn new(optional: Vec<String>, required: Vec<String>) -> Self {
        Self {
            optional,
            required,
            available: Vec::new(),
            enabled: Vec::new(),
        }
    }

    /// Offer one name from the availability sweep
    ///
    /// Records the name as available and enables it when it was requested.
    /// Returns the index in the requested list, as [`match_and_merge`].
    pub fn offer(&mut self, candidate: &str) -> Option<usize> {
        if !self.available.iter().any(|name| name == candidate) {
            self.available.push(candidate.to_owned());
        }
        match_and_merge(candidate, &mut self.enabled, &self.optional)
    }

    /// Close the round: force-include required names and report the ones
    /// the sweep never offered
    ///
    /// The caller decides whether missing names are fatal.
    pub fn finish(&mut self) -> Result<(), Vec<String>> {
        merge_required(&mut self.enabled, &self.required);
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|name| !self.available.iter().any(|seen| seen == *name))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }

    /// Final enabled names, in first-seen order
    pub fn enabled(&self) -> &[String] {
        &self.enabled
    }

    /// Whether negotiation enabled the given name
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.iter().any(|enabled| enabled == name)
    }
}
