use super::handlers::{AsyncHandler, HandlerEntry, HandlerResult, HandlerTable, SyncHandler};
use super::Store;
use crate::state::{Draft, StateBag};
use crate::value::Value;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Caller-supplied named handlers, in registration order.
#[derive(Clone, Default)]
pub struct NamedHandlers {
    sync: Vec<(String, Arc<SyncHandler>)>,
    asynchronous: Vec<(String, Arc<AsyncHandler>)>,
}

impl NamedHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a synchronous handler.
    pub fn sync_handler<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Draft, &[Value]) -> HandlerResult + Send + Sync + 'static,
    {
        self.sync.push((name.into(), Arc::new(handler)));
        self
    }

    /// Add an asynchronous handler.
    pub fn async_handler<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Store, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let handler: Arc<AsyncHandler> = Arc::new(move |store, args| handler(store, args).boxed());
        self.asynchronous.push((name.into(), handler));
        self
    }

    pub fn len(&self) -> usize {
        self.sync.len() + self.asynchronous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Configures and creates a [`Store`].
///
/// Handlers are registered in a fixed order: synchronous named handlers,
/// asynchronous named handlers, then one handler per state key. A name
/// registered again replaces the earlier entry, so a state key shadows a
/// named handler of the same name.
pub struct StoreBuilder {
    states: StateBag,
    handlers: NamedHandlers,
}

impl StoreBuilder {
    pub fn new(states: StateBag) -> Self {
        Self {
            states,
            handlers: NamedHandlers::default(),
        }
    }

    pub fn sync_handler<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Draft, &[Value]) -> HandlerResult + Send + Sync + 'static,
    {
        self.handlers = self.handlers.sync_handler(name, handler);
        self
    }

    pub fn async_handler<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Store, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handlers = self.handlers.async_handler(name, handler);
        self
    }

    /// Append a prepared set of named handlers.
    pub fn handlers(mut self, handlers: NamedHandlers) -> Self {
        self.handlers.sync.extend(handlers.sync);
        self.handlers.asynchronous.extend(handlers.asynchronous);
        self
    }

    pub fn build(self) -> Store {
        let StoreBuilder { states, handlers } = self;
        let mut table = HandlerTable::default();

        for (name, handler) in handlers.sync {
            table.register(name, HandlerEntry::Sync(handler));
        }
        for (name, handler) in handlers.asynchronous {
            table.register(name, HandlerEntry::Async(handler));
        }
        for (index, key) in states.keys().enumerate() {
            table.register(key.to_owned(), HandlerEntry::Key(index));
        }

        debug!(
            keys = states.len(),
            handlers = table.len(),
            "store created"
        );
        Store::from_parts(states, table)
    }
}

/// Create a store from its initial state and named handlers.
pub fn create_store(states: StateBag, handlers: NamedHandlers) -> Store {
    StoreBuilder::new(states).handlers(handlers).build()
}
