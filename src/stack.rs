//! The differentiation context: an arena of nodes plus their creation order.

use std::cell::RefCell;
use std::fmt;
use std::ptr::{self, NonNull};

use log::{debug, trace, warn};

use crate::arena::Arena;
use crate::config::StackConfig;
use crate::errors::{AdError, Result};
use crate::node::{Chainable, LeafVari, Vari};
use crate::var::Var;

/// Owns every node recorded during one evaluation epoch.
///
/// Handles ([`Var`]) borrow the stack they were recorded on, so
/// [`recover`](Stack::recover) and [`release`](Stack::release), which take
/// `&mut self`, can only run once every handle of the epoch is gone. A stack
/// is single-threaded; give each worker its own.
pub struct Stack {
    arena: Arena,
    book: RefCell<Vec<NonNull<dyn Chainable>>>,
    config: StackConfig,
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

impl Stack {
    /// Creates a stack sized from the environment (see [`StackConfig::from_env`]).
    pub fn new() -> Self {
        let config = StackConfig::from_env().unwrap_or_else(|err| {
            warn!("{err}; using default stack sizes");
            StackConfig::default()
        });
        Self::with_config(config)
    }

    /// Creates a stack with explicit initial capacities.
    pub fn with_config(config: StackConfig) -> Self {
        Self {
            arena: Arena::with_capacity(config.arena_bytes),
            book: RefCell::new(Vec::with_capacity(config.node_capacity)),
            config,
        }
    }

    /// The configuration this stack was created with.
    pub fn config(&self) -> StackConfig {
        self.config
    }

    /// Records a new independent variable.
    pub fn var(&self, value: f64) -> Var<'_> {
        Var::from_vari(self, self.push(LeafVari::new(value)))
    }

    /// Records one independent variable per value, in order.
    pub fn vars(&self, values: &[f64]) -> Vec<Var<'_>> {
        values.iter().map(|&v| self.var(v)).collect()
    }

    /// Moves `node` into the arena and appends it to the node list.
    #[inline]
    pub(crate) fn push<C: Chainable + 'static>(&self, node: C) -> &Vari {
        let node: &C = self.arena.alloc(node);
        let ptr: NonNull<dyn Chainable> = NonNull::<C>::from(node);
        self.book.borrow_mut().push(ptr);
        node.vari()
    }

    pub(crate) fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Number of nodes recorded since the last recover.
    pub fn len(&self) -> usize {
        self.book.borrow().len()
    }

    /// Whether no node has been recorded since the last recover.
    pub fn is_empty(&self) -> bool {
        self.book.borrow().is_empty()
    }

    /// Bytes of arena storage currently held.
    pub fn allocated_bytes(&self) -> usize {
        self.arena.allocated_bytes()
    }

    /// Arena chunks currently held.
    pub fn chunk_count(&mut self) -> usize {
        self.arena.chunk_count()
    }

    pub(crate) fn owns(&self, var: &Var<'_>) -> bool {
        ptr::eq(self, var.stack())
    }

    /// Seeds `result` with adjoint 1 and chains every node in reverse
    /// creation order.
    ///
    /// Adjoints accumulate across calls; use
    /// [`zero_adjoints`](Stack::zero_adjoints) between sweeps over one graph.
    pub fn backward(&self, result: Var<'_>) -> Result<()> {
        if !self.owns(&result) {
            return Err(AdError::ForeignHandle);
        }
        result.vari().set_adj(1.0);
        let book = self.book.borrow();
        trace!("backward sweep over {} nodes", book.len());
        for node in book.iter().rev() {
            unsafe { node.as_ref() }.chain();
        }
        Ok(())
    }

    /// Runs [`backward`](Stack::backward) from `result` and reads the
    /// adjoint of each parameter, in order.
    pub fn gradient(&self, result: Var<'_>, params: &[Var<'_>]) -> Result<Vec<f64>> {
        if !params.iter().all(|p| self.owns(p)) {
            return Err(AdError::ForeignHandle);
        }
        self.backward(result)?;
        Ok(params.iter().map(Var::adj).collect())
    }

    /// Resets every recorded adjoint to zero.
    pub fn zero_adjoints(&self) {
        for node in self.book.borrow().iter() {
            unsafe { node.as_ref() }.vari().set_adj(0.0);
        }
    }

    /// Forgets every node and rewinds the arena, keeping its capacity for
    /// the next epoch.
    pub fn recover(&mut self) {
        let book = self.book.get_mut();
        debug!(
            "recovering {} nodes, {} arena bytes held",
            book.len(),
            self.arena.allocated_bytes()
        );
        book.clear();
        self.arena.recover();
    }

    /// Forgets every node and returns all arena and node-list storage to the
    /// system allocator.
    pub fn release(&mut self) {
        debug!(
            "releasing {} nodes, {} arena bytes",
            self.book.get_mut().len(),
            self.arena.allocated_bytes()
        );
        *self.book.get_mut() = Vec::new();
        self.arena.release();
    }

    /// Runs `f` against this stack and recovers afterwards, also when `f`
    /// unwinds.
    ///
    /// Nothing recorded inside `f` can escape it, so results must be plain
    /// values (gradients, log densities, errors).
    pub fn scoped<R>(&mut self, f: impl FnOnce(&Stack) -> R) -> R {
        let guard = RecoverOnDrop(self);
        f(&*guard.0)
    }

    /// Writes one line per node: index, operation, value, adjoint.
    pub fn write_stack<W: fmt::Write>(&self, w: &mut W) -> fmt::Result {
        let book = self.book.borrow();
        writeln!(w, "STACK, size={}", book.len())?;
        for (i, node) in book.iter().enumerate() {
            let node = unsafe { node.as_ref() };
            let vi = node.vari();
            writeln!(
                w,
                "{i:>5} {:<14} val={:<24} adj={}",
                node.name(),
                vi.val(),
                vi.adj()
            )?;
        }
        Ok(())
    }
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_stack(f)
    }
}

struct RecoverOnDrop<'s>(&'s mut Stack);

impl Drop for RecoverOnDrop<'_> {
    fn drop(&mut self) {
        self.0.recover();
    }
}
