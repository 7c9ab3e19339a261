// SPDX-License-Identifier: Apache-2.0

use crate::kmsg::priority::MAX_PRIORITY;
use serde::Deserialize;

/// Default priority for unparsed records (13 = user.notice)
pub const DEFAULT_PRIORITY: u16 = 13;

/// Configuration for the kmsg format handler
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KmsgFormatConfig {
    /// Skip parsing and keep each record verbatim as the message text
    pub no_parse: bool,

    /// Priority assigned to records when `no_parse` is set
    pub default_priority: u16,

    /// Mark parsed messages as originating on the local host
    pub local: bool,
}

impl Default for KmsgFormatConfig {
    fn default() -> Self {
        Self {
            no_parse: false,
            default_priority: DEFAULT_PRIORITY,
            local: false,
        }
    }
}

impl KmsgFormatConfig {
    pub fn new(no_parse: bool, local: bool) -> Self {
        Self {
            no_parse,
            local,
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.default_priority > MAX_PRIORITY {
            return Err(format!(
                "Default priority {} exceeds maximum {}",
                self.default_priority, MAX_PRIORITY
            ));
        }

        Ok(())
    }

    pub fn with_no_parse(mut self, no_parse: bool) -> Self {
        self.no_parse = no_parse;
        self
    }

    pub fn with_default_priority(mut self, default_priority: u16) -> Self {
        self.default_priority = default_priority;
        self
    }

    pub fn with_local(mut self, local: bool) -> Self {
        self.local = local;
        self
    }
}
