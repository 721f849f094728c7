pub mod websocket;

use serde_json::Value;

pub use websocket::{DashboardSocket, WebsocketEventStream};

/// 收到推送消息时的回调，消息原样传递
pub type MessageHandler = Box<dyn FnMut(Value)>;

/// 实时事件推送通道
///
/// `disable()` 返回后不会再调用 handler；已启用时再次 `enable()`
/// 会先隐式 `disable()`，保证同一时刻最多一个订阅。
pub trait EventStream {
    fn enable(&self, on_message: MessageHandler);
    fn disable(&self);
    fn is_enabled(&self) -> bool;
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// 记录 enable/disable 调用的内存实现
    #[derive(Default)]
    pub struct RecordingStream {
        pub calls: RefCell<Vec<&'static str>>,
        handler: RefCell<Option<MessageHandler>>,
        shared_log: Option<Rc<RefCell<Vec<String>>>>,
    }

    impl RecordingStream {
        /// 把调用同时写进插件共享的事件日志，便于断言跨组件顺序
        pub fn with_log(log: Rc<RefCell<Vec<String>>>) -> Self {
            Self {
                shared_log: Some(log),
                ..Default::default()
            }
        }

        pub fn emit(&self, message: Value) -> bool {
            match self.handler.borrow_mut().as_mut() {
                Some(handler) => {
                    handler(message);
                    true
                }
                None => false,
            }
        }

        pub fn count(&self, call: &str) -> usize {
            self.calls.borrow().iter().filter(|c| **c == call).count()
        }

        fn record(&self, call: &'static str) {
            self.calls.borrow_mut().push(call);
            if let Some(log) = &self.shared_log {
                log.borrow_mut().push(format!("stream.{}", call));
            }
        }
    }

    impl EventStream for RecordingStream {
        fn enable(&self, on_message: MessageHandler) {
            if self.is_enabled() {
                self.disable();
            }
            self.record("enable");
            *self.handler.borrow_mut() = Some(on_message);
        }

        fn disable(&self) {
            self.record("disable");
            self.handler.borrow_mut().take();
        }

        fn is_enabled(&self) -> bool {
            self.handler.borrow().is_some()
        }
    }
}
