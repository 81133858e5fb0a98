use crate::{AsyncOperation, InitialState, OperationConfig};

mod operation_test;

pub type TestOperation = AsyncOperation<u32, String>;

pub fn throwing_operation() -> TestOperation {
    AsyncOperation::new(
        InitialState::new(),
        OperationConfig::default().throw_on_error(true),
    )
}
