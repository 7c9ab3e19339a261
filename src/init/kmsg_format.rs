// SPDX-License-Identifier: Apache-2.0

use crate::kmsg::config::{DEFAULT_PRIORITY, KmsgFormatConfig};
use clap::Args;
use serde::Deserialize;

#[derive(Debug, Args, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KmsgFormatArgs {
    /// Keep each record verbatim as the message text instead of parsing it
    #[arg(long, env = "KMSG_FORMAT_NO_PARSE", default_value = "false")]
    pub kmsg_format_no_parse: bool,

    /// Priority assigned to unparsed records (0-1023, default: 13)
    #[arg(long, env = "KMSG_FORMAT_DEFAULT_PRIORITY")]
    pub kmsg_format_default_priority: Option<u16>,

    /// Mark parsed messages as originating on the local host
    #[arg(long, env = "KMSG_FORMAT_LOCAL", default_value = "false")]
    pub kmsg_format_local: bool,
}

impl KmsgFormatArgs {
    pub fn build_config(&self) -> KmsgFormatConfig {
        KmsgFormatConfig::new(self.kmsg_format_no_parse, self.kmsg_format_local)
            .with_default_priority(
                self.kmsg_format_default_priority
                    .unwrap_or(DEFAULT_PRIORITY),
            )
    }
}
