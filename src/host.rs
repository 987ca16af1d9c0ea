//! The host adapter: turns one line of the JSON command protocol into zero
//! or more [`Event`]s, dispatched against an owned [`Extractor`].

use log::warn;
use serde_json::Value;

use crate::event::Event;
use crate::extractor::Extractor;
use crate::payload::PayloadDocument;

/// Owns the extractor and the "has `add` been seen yet" gate: before the
/// `add` command arrives, `skipped`/`push` are accepted but produce no
/// events at all, matching the reference harness's management test.
pub struct Dispatcher {
    extractor: Extractor,
    enabled: bool,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            extractor: Extractor::new(),
            enabled: false,
        }
    }

    /// Install a payload document read from `--payload` before the host
    /// sends its first command.
    pub fn preload_payload(&mut self, doc: PayloadDocument) {
        self.extractor.set_payload(doc);
    }

    /// Parse and act on one line of the command protocol. Malformed lines
    /// and unrecognised command names are logged and otherwise ignored.
    pub fn handle_line(&mut self, line: &str) -> Vec<Event> {
        let mut events = Vec::new();

        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => {
                warn!("could not parse command line {:?}: {}", line, err);
                return events;
            }
        };
        let Some(array) = value.as_array() else {
            warn!("command line is not a JSON array: {:?}", line);
            return events;
        };
        let Some(name) = array.first().and_then(Value::as_str) else {
            warn!("command line has no command name: {:?}", line);
            return events;
        };

        match name {
            "add" => self.enabled = true,
            "skipped" => {
                let Some(n) = array.get(1).and_then(Value::as_u64) else {
                    warn!("skipped command missing a byte count: {:?}", line);
                    return events;
                };
                if self.enabled {
                    self.extractor.skipped(n as usize, &mut events);
                }
            }
            "push" => {
                let Some(byte_str) = array.get(1).and_then(Value::as_str) else {
                    warn!("push command missing its byte: {:?}", line);
                    return events;
                };
                if self.enabled {
                    for byte in byte_str.bytes() {
                        self.extractor.push(byte, &mut events);
                    }
                }
            }
            "set_current_payload" => {
                let Some(doc_value) = array.get(1) else {
                    warn!("set_current_payload command missing its document: {:?}", line);
                    return events;
                };
                match PayloadDocument::from_value(doc_value) {
                    Ok(doc) => self.extractor.set_payload(doc),
                    Err(_) => warn!("set_current_payload command has a malformed document"),
                }
            }
            other => warn!("unrecognised command: {:?}", other),
        }

        events
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
