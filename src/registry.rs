//! Closed set of DynamoDB operations the gateway may invoke.
//!
//! Every invocable name maps to an [`Action`] variant, and the connection
//! handle matches on that variant. Names that are not listed here can never
//! reach the client.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;

/// A statically bound DynamoDB operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ListTables,
    DescribeTable,
    CreateTable,
    DeleteTable,
    GetItem,
    PutItem,
    UpdateItem,
    DeleteItem,
    Query,
    Scan,
    BatchGetItem,
    BatchWriteItem,
    TransactGetItems,
    TransactWriteItems,
    ExecuteStatement,
}

impl Action {
    pub const ALL: [Action; 15] = [
        Action::ListTables,
        Action::DescribeTable,
        Action::CreateTable,
        Action::DeleteTable,
        Action::GetItem,
        Action::PutItem,
        Action::UpdateItem,
        Action::DeleteItem,
        Action::Query,
        Action::Scan,
        Action::BatchGetItem,
        Action::BatchWriteItem,
        Action::TransactGetItems,
        Action::TransactWriteItems,
        Action::ExecuteStatement,
    ];

    /// Operation name as the host spells it
    pub fn name(&self) -> &'static str {
        match self {
            Action::ListTables => "listTables",
            Action::DescribeTable => "describeTable",
            Action::CreateTable => "createTable",
            Action::DeleteTable => "deleteTable",
            Action::GetItem => "getItem",
            Action::PutItem => "putItem",
            Action::UpdateItem => "updateItem",
            Action::DeleteItem => "deleteItem",
            Action::Query => "query",
            Action::Scan => "scan",
            Action::BatchGetItem => "batchGetItem",
            Action::BatchWriteItem => "batchWriteItem",
            Action::TransactGetItems => "transactGetItems",
            Action::TransactWriteItems => "transactWriteItems",
            Action::ExecuteStatement => "executeStatement",
        }
    }

    /// Invocation signature of this action
    pub fn spec(self) -> ActionSpec {
        ActionSpec {
            name: self.name(),
            action: self,
            kind: self.kind(),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::ListTables
            | Action::DescribeTable
            | Action::GetItem
            | Action::Query
            | Action::Scan
            | Action::BatchGetItem
            | Action::TransactGetItems => ActionKind::Read,
            // PartiQL statements can write
            Action::ExecuteStatement
            | Action::CreateTable
            | Action::DeleteTable
            | Action::PutItem
            | Action::UpdateItem
            | Action::DeleteItem
            | Action::BatchWriteItem
            | Action::TransactWriteItems => ActionKind::Mutating,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether an action can change remote state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Read,
    Mutating,
}

/// Invocation signature of a registered action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpec {
    pub name: &'static str,
    pub action: Action,
    pub kind: ActionKind,
}

/// Name to action lookup table
#[derive(Debug, Clone)]
pub struct ActionRegistry {
    specs: HashMap<&'static str, ActionSpec>,
}

lazy_static! {
    static ref DEFAULT_REGISTRY: ActionRegistry = ActionRegistry::new(&Action::ALL);
}

impl ActionRegistry {
    /// Registry restricted to the given actions
    pub fn new(actions: &[Action]) -> Self {
        let specs = actions
            .iter()
            .map(|action| (action.name(), action.spec()))
            .collect();
        Self { specs }
    }

    /// Shared registry with every supported action
    pub fn global() -> &'static ActionRegistry {
        &DEFAULT_REGISTRY
    }

    pub fn resolve(&self, name: &str) -> Option<&ActionSpec> {
        self.specs.get(name)
    }

    /// Registered names in declaration order
    pub fn names(&self) -> Vec<&'static str> {
        Action::ALL
            .iter()
            .map(Action::name)
            .filter(|name| self.specs.contains_key(name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::global().clone()
    }
}
