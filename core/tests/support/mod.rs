//! Scripted in-memory transport shared by the integration tests.
//!
//! `ScriptedTransport` is handed to the controller; the paired `Remote`
//! stays with the test and plays the network: it fills in the response and
//! fires signals whenever the test decides.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use xhr_core::{ReadyState, ResponseData, ResponseType, Signal, SignalSink, Transport};

#[derive(Debug)]
struct Script {
    calls: Vec<String>,
    response_type: Option<ResponseType>,
    ready_state: ReadyState,
    status: u16,
    status_text: String,
    raw_headers: String,
    body: String,
    aborted: bool,
    sent: bool,
    sink: Option<SignalSink>,
}

pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

#[derive(Clone)]
pub struct Remote {
    script: Arc<Mutex<Script>>,
}

pub fn scripted() -> (ScriptedTransport, Remote) {
    let script = Arc::new(Mutex::new(Script {
        calls: Vec::new(),
        response_type: None,
        ready_state: ReadyState::Unsent,
        status: 0,
        status_text: String::new(),
        raw_headers: String::new(),
        body: String::new(),
        aborted: false,
        sent: false,
        sink: None,
    }));
    (
        ScriptedTransport {
            script: script.clone(),
        },
        Remote { script },
    )
}

impl Remote {
    pub fn calls(&self) -> Vec<String> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn is_sent(&self) -> bool {
        self.script.lock().unwrap().sent
    }

    pub fn is_aborted(&self) -> bool {
        self.script.lock().unwrap().aborted
    }

    /// Complete the exchange and announce it.
    pub fn respond(&self, status: u16, status_text: &str, raw_headers: &str, body: &str) {
        {
            let mut script = self.script.lock().unwrap();
            script.ready_state = ReadyState::Done;
            script.status = status;
            script.status_text = status_text.to_string();
            script.raw_headers = raw_headers.to_string();
            script.body = body.to_string();
        }
        self.fire(Signal::ReadyStateChange);
    }

    pub fn progress(&self, ready_state: ReadyState) {
        self.script.lock().unwrap().ready_state = ready_state;
        self.fire(Signal::ReadyStateChange);
    }

    pub fn fire(&self, signal: Signal) {
        let sink = self.script.lock().unwrap().sink.clone();
        if let Some(sink) = sink {
            sink.emit(signal);
        }
    }

    /// Forget the sink, as a transport that vanished would.
    pub fn drop_sink(&self) {
        self.script.lock().unwrap().sink = None;
    }

    /// Yield until the controller has sent the request.
    pub async fn until_sent(&self) {
        while !self.is_sent() {
            tokio::task::yield_now().await;
        }
    }
}

impl Transport for ScriptedTransport {
    fn set_response_type(&mut self, response_type: ResponseType) {
        let mut script = self.script.lock().unwrap();
        script.response_type = Some(response_type);
        script.calls.push(format!("response_type {response_type:?}"));
    }

    fn set_timeout(&mut self, timeout_ms: u64) {
        self.script.lock().unwrap().calls.push(format!("timeout {timeout_ms}"));
    }

    fn set_with_credentials(&mut self, with_credentials: bool) {
        self.script
            .lock()
            .unwrap()
            .calls
            .push(format!("with_credentials {with_credentials}"));
    }

    fn open(&mut self, method: &str, url: &str, asynchronous: bool) {
        let mut script = self.script.lock().unwrap();
        script.ready_state = ReadyState::Opened;
        script.calls.push(format!("open {method} {url} {asynchronous}"));
    }

    fn subscribe(&mut self, sink: SignalSink) {
        let mut script = self.script.lock().unwrap();
        script.sink = Some(sink);
        script.calls.push("subscribe".to_string());
    }

    fn set_request_header(&mut self, name: &str, value: &str) {
        self.script
            .lock()
            .unwrap()
            .calls
            .push(format!("header {name}: {value}"));
    }

    fn send(&mut self, body: Option<&str>) {
        let mut script = self.script.lock().unwrap();
        script.sent = true;
        script.calls.push(format!("send {body:?}"));
    }

    /// Like a browser: jump to `Done` with status 0 and announce it.
    fn abort(&mut self) {
        let sink = {
            let mut script = self.script.lock().unwrap();
            script.aborted = true;
            script.ready_state = ReadyState::Done;
            script.status = 0;
            script.sink.clone()
        };
        if let Some(sink) = sink {
            sink.ready_state_changed();
        }
    }

    fn ready_state(&self) -> ReadyState {
        self.script.lock().unwrap().ready_state
    }

    fn status(&self) -> u16 {
        self.script.lock().unwrap().status
    }

    fn status_text(&self) -> String {
        self.script.lock().unwrap().status_text.clone()
    }

    fn all_response_headers(&self) -> String {
        self.script.lock().unwrap().raw_headers.clone()
    }

    fn response_text(&self) -> String {
        self.script.lock().unwrap().body.clone()
    }

    fn response(&self) -> ResponseData {
        let script = self.script.lock().unwrap();
        match script.response_type {
            Some(ResponseType::Json) => serde_json::from_str(&script.body)
                .map(ResponseData::Json)
                .unwrap_or(ResponseData::Empty),
            Some(ResponseType::ArrayBuffer) => ResponseData::Bytes(script.body.clone().into_bytes()),
            _ if script.body.is_empty() => ResponseData::Empty,
            _ => ResponseData::Text(script.body.clone()),
        }
    }
}
