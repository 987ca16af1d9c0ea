//! The framing state machine: finds `$$`-delimited, `\n`-terminated UKHAS
//! sentences in a noisy byte stream and hands complete captures to
//! [`crate::ukhas`].

use ringbuffer::{AllocRingBuffer, RingBuffer};

use crate::event::Event;
use crate::payload::PayloadDocument;
use crate::ukhas;

const MAX_BUFFER_SIZE: usize = 1024;
const MAX_GARBAGE: usize = 32;
const MAX_SKIPPED: usize = 50;

fn in_sentence_alphabet(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b' ' || matches!(byte, b',' | b'.' | b'*' | b'-' | b'+' | b'_')
}

#[derive(Debug, PartialEq, Eq)]
enum State {
    Idle,
    Capturing,
}

/// Owns the framing state and the currently installed payload document.
pub struct Extractor {
    state: State,
    window: AllocRingBuffer<u8>,
    buffer: Vec<u8>,
    garbage_count: usize,
    skipped_count: usize,
    payload: Option<PayloadDocument>,
}

impl Extractor {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            window: AllocRingBuffer::new(2),
            buffer: Vec::new(),
            garbage_count: 0,
            skipped_count: 0,
            payload: None,
        }
    }

    pub fn set_payload(&mut self, doc: PayloadDocument) {
        self.payload = Some(doc);
    }

    /// Feed one byte from the serial stream, appending any resulting
    /// events to `events`.
    pub fn push(&mut self, byte: u8, events: &mut Vec<Event>) {
        match self.state {
            State::Idle => {
                self.window.push(byte);
                if self.window.len() == 2 && self.window.iter().copied().eq([b'$', b'$']) {
                    self.start_capture(events);
                }
            }
            State::Capturing => self.push_while_capturing(byte, events),
        }
    }

    fn push_while_capturing(&mut self, byte: u8, events: &mut Vec<Event>) {
        self.buffer.push(byte);

        if byte == b'\n' {
            self.finish_capture(events);
            return;
        }

        if self.buffer.len() >= 2 && self.buffer[self.buffer.len() - 2..] == *b"$$" {
            events.push(Event::Status("start delim".to_string()));
            self.buffer.clear();
            self.buffer.extend_from_slice(b"$$");
            self.garbage_count = 0;
            self.skipped_count = 0;
            return;
        }

        if !in_sentence_alphabet(byte) {
            self.garbage_count += 1;
            if self.garbage_count > MAX_GARBAGE {
                events.push(Event::Status("giving up".to_string()));
                self.give_up();
                return;
            }
        }

        if self.buffer.len() + self.skipped_count >= MAX_BUFFER_SIZE {
            events.push(Event::Status("giving up".to_string()));
            self.give_up();
        }
    }

    /// Record that `n` bytes were lost from the serial stream.
    pub fn skipped(&mut self, n: usize, events: &mut Vec<Event>) {
        if self.state != State::Capturing {
            return;
        }
        self.skipped_count += n;
        if self.skipped_count > MAX_SKIPPED || self.buffer.len() + self.skipped_count >= MAX_BUFFER_SIZE {
            events.push(Event::Status("giving up".to_string()));
            self.give_up();
        }
    }

    fn start_capture(&mut self, events: &mut Vec<Event>) {
        events.push(Event::Status("start delim".to_string()));
        self.state = State::Capturing;
        self.buffer.clear();
        self.buffer.extend_from_slice(b"$$");
        self.garbage_count = 0;
        self.skipped_count = 0;
    }

    fn finish_capture(&mut self, events: &mut Vec<Event>) {
        let captured = String::from_utf8_lossy(&self.buffer).into_owned();
        events.push(Event::Upload(captured));
        events.push(Event::Status("extracted".to_string()));

        let outcome = ukhas::parse(&self.buffer, self.payload.as_ref());
        for status in outcome.statuses {
            events.push(Event::Status(status));
        }
        events.push(Event::Data(Some(outcome.record)));

        self.reset_to_idle();
    }

    fn give_up(&mut self) {
        self.reset_to_idle();
    }

    fn reset_to_idle(&mut self) {
        self.state = State::Idle;
        self.buffer.clear();
        self.garbage_count = 0;
        self.skipped_count = 0;
        self.window.clear();
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}
