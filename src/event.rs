//! The wire shape of events sent from the extractor to the host: a JSON
//! array whose first element names the event.

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Status(String),
    Upload(String),
    Data(Option<Map<String, Value>>),
}

impl Event {
    pub fn to_value(&self) -> Value {
        match self {
            Event::Status(message) => Value::Array(vec![
                Value::String("status".to_string()),
                Value::String(message.clone()),
            ]),
            Event::Upload(captured) => Value::Array(vec![
                Value::String("upload".to_string()),
                Value::String(captured.clone()),
            ]),
            Event::Data(Some(record)) => Value::Array(vec![
                Value::String("data".to_string()),
                Value::Object(record.clone()),
            ]),
            Event::Data(None) => Value::Array(vec![Value::String("data".to_string())]),
        }
    }
}
