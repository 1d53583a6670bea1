// In-memory transport used by the endpoint and façade tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::config::Namespaces;
use crate::error::SoapError;
use crate::invoker::{ClientHandle, SoapInvoker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Nothing,
    BuildClient,
    Call,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub wsdl_url: String,
    pub action: String,
    pub message: Value,
    pub namespaces: Namespaces,
}

#[derive(Default)]
struct StubState {
    builds: AtomicUsize,
    calls: AtomicUsize,
    recorded: Mutex<Vec<RecordedCall>>,
}

pub struct StubInvoker {
    response: Value,
    operations: Vec<String>,
    fail_on: FailOn,
    state: Arc<StubState>,
}

impl StubInvoker {
    pub fn responding(response: Value) -> Self {
        Self {
            response,
            operations: Vec::new(),
            fail_on: FailOn::Nothing,
            state: Arc::default(),
        }
    }

    pub fn failing(fail_on: FailOn) -> Self {
        Self {
            fail_on,
            ..Self::responding(Value::Null)
        }
    }

    pub fn with_operations(mut self, operations: &[&str]) -> Self {
        self.operations = operations.iter().map(|op| op.to_string()).collect();
        self
    }

    pub fn build_count(&self) -> usize {
        self.state.builds.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.state.recorded.lock().clone()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.state.recorded.lock().last().cloned()
    }
}

#[async_trait]
impl SoapInvoker for StubInvoker {
    async fn build_client(
        &self,
        wsdl_url: &str,
        namespaces: &Namespaces,
        _auth_header: &Value,
    ) -> Result<Box<dyn ClientHandle>, SoapError> {
        self.state.builds.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == FailOn::BuildClient {
            return Err(SoapError::Wsdl("stubbed WSDL failure".to_string()));
        }

        Ok(Box::new(StubClient {
            wsdl_url: wsdl_url.to_string(),
            namespaces: namespaces.clone(),
            response: self.response.clone(),
            operations: self.operations.clone(),
            fail_on: self.fail_on,
            state: Arc::clone(&self.state),
        }))
    }
}

struct StubClient {
    wsdl_url: String,
    namespaces: Namespaces,
    response: Value,
    operations: Vec<String>,
    fail_on: FailOn,
    state: Arc<StubState>,
}

#[async_trait]
impl ClientHandle for StubClient {
    async fn call(&self, action: &str, message: &Value) -> Result<Value, SoapError> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        self.state.recorded.lock().push(RecordedCall {
            wsdl_url: self.wsdl_url.clone(),
            action: action.to_string(),
            message: message.clone(),
            namespaces: self.namespaces.clone(),
        });

        if self.fail_on == FailOn::Call {
            return Err(SoapError::Fault {
                code: "soap:Server".to_string(),
                message: "stubbed call failure".to_string(),
            });
        }
        Ok(self.response.clone())
    }

    async fn list_operations(&self) -> Result<Vec<String>, SoapError> {
        if self.fail_on == FailOn::Call {
            return Err(SoapError::UnexpectedResponse("stubbed listing failure".to_string()));
        }
        Ok(self.operations.clone())
    }
}
