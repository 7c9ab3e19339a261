// SPDX-License-Identifier: Apache-2.0

//! Convert kmsg log messages to OTLP log records

use crate::kmsg::priority::{Facility, Level};
use crate::message::{LogMessage, MESSAGE_KEY, MSGID_KEY, MessageFlags};
use gethostname::gethostname;
use opentelemetry_proto::tonic::common::v1::{AnyValue, InstrumentationScope, KeyValue, any_value};
use opentelemetry_proto::tonic::logs::v1::{LogRecord, ResourceLogs, ScopeLogs};
use opentelemetry_proto::tonic::resource::v1::Resource;
use std::time::{SystemTime, UNIX_EPOCH};

// Log record attributes
const KMSG_PRIORITY_KEY: &str = "kmsg.priority";
const KMSG_PRIORITY_NAME_KEY: &str = "kmsg.priority_name";
const KMSG_FACILITY_KEY: &str = "kmsg.facility";
const KMSG_FACILITY_NAME_KEY: &str = "kmsg.facility_name";
const KMSG_SEQUENCE_KEY: &str = "kmsg.sequence";
const KMSG_PARSE_ERROR_KEY: &str = "kmsg.parse_error";

// Resource attributes
const LOG_SOURCE_KEY: &str = "log.source";
const LOG_SOURCE_VALUE: &str = "kmsg";
const HOST_NAME_KEY: &str = "host.name";
const OS_TYPE_KEY: &str = "os.type";
const OS_TYPE_VALUE: &str = "linux";
const SERVICE_NAME_KEY: &str = "service.name";
const SERVICE_NAME_VALUE: &str = "kernel";

/// Convert a batch of messages to OTLP ResourceLogs
pub fn convert_to_otlp_logs(messages: &[LogMessage]) -> ResourceLogs {
    let log_records: Vec<LogRecord> = messages
        .iter()
        .map(convert_message_to_log_record)
        .collect();

    let scope_logs = ScopeLogs {
        scope: Some(InstrumentationScope {
            name: "kmsg".to_string(),
            version: String::new(),
            attributes: vec![],
            dropped_attributes_count: 0,
        }),
        log_records,
        schema_url: String::new(),
    };

    let mut resource_attributes = vec![
        string_attribute(LOG_SOURCE_KEY, LOG_SOURCE_VALUE.to_string()),
        string_attribute(OS_TYPE_KEY, OS_TYPE_VALUE.to_string()),
        string_attribute(SERVICE_NAME_KEY, SERVICE_NAME_VALUE.to_string()),
    ];

    if let Ok(hostname) = gethostname().into_string() {
        resource_attributes.push(string_attribute(HOST_NAME_KEY, hostname));
    }

    ResourceLogs {
        resource: Some(Resource {
            attributes: resource_attributes,
            dropped_attributes_count: 0,
            entity_refs: vec![],
        }),
        scope_logs: vec![scope_logs],
        schema_url: String::new(),
    }
}

/// Convert a single message to an OTLP LogRecord.
///
/// `.linux.*` values become attributes with the leading dot removed, the
/// sequence number becomes `kmsg.sequence`.
pub fn convert_message_to_log_record(msg: &LogMessage) -> LogRecord {
    let observed_time_unix_nano = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    let level = Level::from_priority(msg.priority);

    let mut attributes = vec![
        int_attribute(KMSG_PRIORITY_KEY, i64::from(msg.priority & 0x07)),
        string_attribute(KMSG_PRIORITY_NAME_KEY, level.as_str().to_string()),
        int_attribute(KMSG_FACILITY_KEY, i64::from(Facility::code(msg.priority))),
    ];

    if let Some(facility) = Facility::from_priority(msg.priority) {
        attributes.push(string_attribute(
            KMSG_FACILITY_NAME_KEY,
            facility.as_str().to_string(),
        ));
    }

    if let Some(sequence) = msg.value_lossy(MSGID_KEY) {
        let value = match sequence.parse::<i64>() {
            Ok(n) => any_value::Value::IntValue(n),
            Err(_) => any_value::Value::StringValue(sequence.into_owned()),
        };
        attributes.push(KeyValue {
            key: KMSG_SEQUENCE_KEY.to_string(),
            value: Some(AnyValue { value: Some(value) }),
        });
    }

    if msg.flags.contains(MessageFlags::PARSE_ERROR) {
        attributes.push(KeyValue {
            key: KMSG_PARSE_ERROR_KEY.to_string(),
            value: Some(AnyValue {
                value: Some(any_value::Value::BoolValue(true)),
            }),
        });
    }

    for (name, value) in msg.values() {
        if let Some(key) = name.strip_prefix(b".") {
            attributes.push(string_attribute(
                &String::from_utf8_lossy(key),
                String::from_utf8_lossy(value).into_owned(),
            ));
        }
    }

    let body = msg
        .value_lossy(MESSAGE_KEY)
        .map(|message| AnyValue {
            value: Some(any_value::Value::StringValue(message.into_owned())),
        });

    LogRecord {
        time_unix_nano: msg.timestamp.unix_nanos(),
        observed_time_unix_nano,
        severity_number: level.to_otel_severity_number(),
        severity_text: level.as_str().to_string(),
        body,
        attributes,
        dropped_attributes_count: 0,
        flags: 0,
        trace_id: vec![],
        span_id: vec![],
        event_name: String::new(),
    }
}

fn string_attribute(key: &str, value: String) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: Some(AnyValue {
            value: Some(any_value::Value::StringValue(value)),
        }),
    }
}

fn int_attribute(key: &str, value: i64) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: Some(AnyValue {
            value: Some(any_value::Value::IntValue(value)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmsg::boot_time::BootTime;
    use crate::kmsg::config::KmsgFormatConfig;
    use crate::kmsg::format::KmsgFormat;
    use crate::message::FixedZone;

    fn parse(data: &[u8]) -> LogMessage {
        KmsgFormat::new(KmsgFormatConfig::default())
            .unwrap()
            .with_boot_time(BootTime::new(1_000, 0))
            .with_zone(FixedZone(0))
            .parse(data)
            .0
    }

    fn find<'a>(record: &'a LogRecord, key: &str) -> Option<&'a any_value::Value> {
        record
            .attributes
            .iter()
            .find(|kv| kv.key == key)
            .and_then(|kv| kv.value.as_ref())
            .and_then(|v| v.value.as_ref())
    }

    #[test]
    fn test_convert_parsed_message() {
        let msg = parse(b"3,1234,5000000;disk error\n DEVICE=b8:0\n SUBSYSTEM=block\n");
        let log_record = convert_message_to_log_record(&msg);

        // boot time + 5s
        assert_eq!(log_record.time_unix_nano, 1_005_000_000_000);
        assert!(log_record.observed_time_unix_nano > 0);
        assert_eq!(log_record.severity_number, 17);
        assert_eq!(log_record.severity_text, "ERROR");

        if let Some(AnyValue {
            value: Some(any_value::Value::StringValue(body)),
        }) = &log_record.body
        {
            assert_eq!(body, "disk error");
        } else {
            panic!("Expected string body");
        }

        assert_eq!(
            find(&log_record, KMSG_SEQUENCE_KEY),
            Some(&any_value::Value::IntValue(1234))
        );
        assert_eq!(
            find(&log_record, "linux.DEVICE.type"),
            Some(&any_value::Value::StringValue("block".to_string()))
        );
        assert_eq!(
            find(&log_record, "linux.SUBSYSTEM"),
            Some(&any_value::Value::StringValue("block".to_string()))
        );
        assert_eq!(find(&log_record, KMSG_PARSE_ERROR_KEY), None);
        // Only namespaced values become attributes
        assert_eq!(find(&log_record, MESSAGE_KEY), None);
    }

    #[test]
    fn test_convert_record_with_facility() {
        // Priority 14 = facility 1 (user) + level 6 (info)
        let msg = parse(b"14,1,1;user space message");
        let log_record = convert_message_to_log_record(&msg);

        assert_eq!(
            find(&log_record, KMSG_PRIORITY_KEY),
            Some(&any_value::Value::IntValue(6))
        );
        assert_eq!(
            find(&log_record, KMSG_FACILITY_KEY),
            Some(&any_value::Value::IntValue(1))
        );
        assert_eq!(
            find(&log_record, KMSG_FACILITY_NAME_KEY),
            Some(&any_value::Value::StringValue("user".to_string()))
        );
    }

    #[test]
    fn test_convert_unnamed_facility() {
        let msg = parse(b"1000,1,1;high facility");
        let log_record = convert_message_to_log_record(&msg);

        assert_eq!(
            find(&log_record, KMSG_FACILITY_KEY),
            Some(&any_value::Value::IntValue(125))
        );
        assert_eq!(find(&log_record, KMSG_FACILITY_NAME_KEY), None);
    }

    #[test]
    fn test_convert_unparsable_message() {
        let msg = parse(b"garbage");
        let log_record = convert_message_to_log_record(&msg);

        assert_eq!(
            find(&log_record, KMSG_PARSE_ERROR_KEY),
            Some(&any_value::Value::BoolValue(true))
        );
        assert_eq!(log_record.severity_text, "ERROR");
        assert_eq!(find(&log_record, KMSG_SEQUENCE_KEY), None);
    }

    #[test]
    fn test_convert_batch() {
        let messages = vec![
            parse(b"3,100,1000000;Error 1"),
            parse(b"6,101,2000000;Info 1"),
        ];

        let resource_logs = convert_to_otlp_logs(&messages);

        let records = &resource_logs.scope_logs[0].log_records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].severity_number, 17);
        assert_eq!(records[1].severity_number, 9);
        assert!(records[1].time_unix_nano > records[0].time_unix_nano);

        let resource = resource_logs.resource.unwrap();
        assert!(resource.attributes.iter().any(|kv| kv.key == LOG_SOURCE_KEY));
    }
}
