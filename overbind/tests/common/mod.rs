#![allow(dead_code)]

use overbind::{Extends, HandlerTable, HandlerTableBuilder};
use std::any::Any;

// ============================================================================
// Receivers
// ============================================================================

#[derive(Default, Debug)]
pub struct Dispatcher {
    pub log: Vec<String>,
}

impl Dispatcher {
    pub fn record(&mut self, entry: impl Into<String>) {
        self.log.push(entry.into());
    }
}

/// A receiver that inherits every `Dispatcher` handler.
#[derive(Default, Debug)]
pub struct AuditingDispatcher {
    pub inner: Dispatcher,
    pub audited: usize,
}

impl Extends<Dispatcher> for AuditingDispatcher {
    fn as_base(&self) -> &Dispatcher {
        &self.inner
    }
    fn as_base_mut(&mut self) -> &mut Dispatcher {
        &mut self.inner
    }
}

// ============================================================================
// Operations
// ============================================================================

#[derive(Debug, Clone)]
pub struct AddOp {
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct RemoveOp {
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct UnknownOp;

/// Base operation with a derived `BatchOp`.
#[derive(Debug, Clone)]
pub struct Op {
    pub id: u32,
}

#[derive(Debug, Clone)]
pub struct BatchOp {
    pub op: Op,
    pub size: usize,
}

impl Extends<Op> for BatchOp {
    fn as_base(&self) -> &Op {
        &self.op
    }
    fn as_base_mut(&mut self) -> &mut Op {
        &mut self.op
    }
}

/// Derived from `BatchOp`, so two steps away from `Op`.
#[derive(Debug, Clone)]
pub struct PriorityBatchOp {
    pub batch: BatchOp,
    pub priority: u8,
}

impl Extends<BatchOp> for PriorityBatchOp {
    fn as_base(&self) -> &BatchOp {
        &self.batch
    }
    fn as_base_mut(&mut self) -> &mut BatchOp {
        &mut self.batch
    }
}

pub fn add(key: &str) -> AddOp {
    AddOp { key: key.into() }
}

pub fn remove(key: &str) -> RemoveOp {
    RemoveOp { key: key.into() }
}

// ============================================================================
// Tables
// ============================================================================

/// The `Dispatcher` handlers: `handle(AddOp)`, `handle(RemoveOp)`,
/// `handle(Any)`, plus `on_handle` for routing.
pub fn dispatcher_builder() -> HandlerTableBuilder {
    HandlerTable::builder()
        .derive::<AuditingDispatcher, Dispatcher>()
        .derive::<BatchOp, Op>()
        .derive::<PriorityBatchOp, BatchOp>()
        .register_type::<UnknownOp>()
        .handler("handle", |d: &mut Dispatcher, op: &AddOp| {
            d.record(format!("add {}", op.key));
            "add"
        })
        .handler("handle", |d: &mut Dispatcher, op: &RemoveOp| {
            d.record(format!("remove {}", op.key));
            "remove"
        })
        .fallback("handle", |d: &mut Dispatcher, _: &dyn Any| {
            d.record("object");
            "object"
        })
        .handler("on_handle", |d: &mut Dispatcher, op: &AddOp| {
            d.record(format!("on add {}", op.key));
            "on add"
        })
        .handler("handle", |d: &mut Dispatcher, op: &Op| {
            d.record(format!("op {}", op.id));
            "op"
        })
        .handler("handle", |d: &mut AuditingDispatcher, op: &RemoveOp| {
            d.audited += 1;
            d.inner.record(format!("audited remove {}", op.key));
            "audited remove"
        })
}

pub fn dispatcher_table() -> HandlerTable {
    dispatcher_builder().build().expect("dispatcher table")
}
