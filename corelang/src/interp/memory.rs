//! Bindings, frames and call activations over a reference-counted heap
//!
//! Layout:
//!
//! ```text
//! globals:    [Binding, ...]                    declaration phase only
//! call stack: [FrameStack (main), FrameStack (p), ...]
//! FrameStack: [Frame (base), Frame (if/while), ...]
//! Frame:      [Binding, ...]                    searched newest first
//! ```
//!
//! A name is looked up in the innermost activation's frames, then among the
//! globals. Every change to which array a binding points at goes through
//! this module, so refcounts always equal the number of live bindings that
//! hold the array.

use tracing::{debug, trace};

use crate::ast::VarKind;

use super::error::{InterpResult, RuntimeError};
use super::heap::{ArrayId, Heap};
use super::transcript::{Event, Transcript};
use super::value::{Binding, Value};

/// One lexical block
#[derive(Debug, Default)]
pub struct Frame {
    bindings: Vec<Binding>,
}

impl Frame {
    fn find(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().rev().find(|b| b.name == name)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut Binding> {
        self.bindings.iter_mut().rev().find(|b| b.name == name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// The block frames of one procedure activation
#[derive(Debug)]
pub struct FrameStack {
    frames: Vec<Frame>,
}

impl FrameStack {
    fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.frames.iter().any(|frame| frame.find(name).is_some())
    }

    fn find(&self, name: &str) -> Option<&Binding> {
        self.frames.iter().rev().find_map(|frame| frame.find(name))
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut Binding> {
        self.frames.iter_mut().rev().find_map(|frame| frame.find_mut(name))
    }

    fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    fn top_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    fn binding_count(&self) -> usize {
        self.frames.iter().map(Frame::len).sum()
    }
}

/// Activations, main at the bottom
#[derive(Debug)]
pub struct CallStack {
    activations: Vec<FrameStack>,
}

impl CallStack {
    fn new() -> Self {
        Self {
            activations: vec![FrameStack::new()],
        }
    }

    fn active(&self) -> Option<&FrameStack> {
        self.activations.last()
    }

    fn active_mut(&mut self) -> Option<&mut FrameStack> {
        self.activations.last_mut()
    }

    pub fn depth(&self) -> usize {
        self.activations.len()
    }
}

/// An array reference resolved in one scope, ready to be bound in another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedRef(Option<ArrayId>);

/// Owner of every binding, the heap and the transcript
#[derive(Debug)]
pub struct MemoryStore {
    globals: Vec<Binding>,
    call_stack: CallStack,
    heap: Heap,
    declarations_done: bool,
    transcript: Transcript,
    /// Largest array `allocate_array` will create
    max_array_len: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            globals: Vec::new(),
            call_stack: CallStack::new(),
            heap: Heap::new(),
            declarations_done: false,
            transcript: Transcript::new(),
            max_array_len: usize::MAX,
        }
    }

    /// Cap the element count of every later allocation.
    pub fn with_max_array_len(mut self, len: usize) -> Self {
        self.max_array_len = len;
        self
    }

    // ===== Declarations =====

    /// Bind `name` to the default value for `kind` in the active scope.
    pub fn declare(&mut self, kind: VarKind, name: &str) -> InterpResult<()> {
        let binding = Binding::new(name, Value::default_for(kind));
        if !self.declarations_done {
            if self.globals.iter().any(|b| b.name == name) {
                return Err(RuntimeError::double_declaration(name));
            }
            trace!(var = name, %kind, "declare global");
            self.globals.push(binding);
            return Ok(());
        }

        let Some(active) = self.call_stack.active_mut() else {
            return Err(RuntimeError::undeclared_variable(name));
        };
        if active.contains(name) {
            return Err(RuntimeError::double_declaration(name));
        }
        trace!(var = name, %kind, "declare local");
        if let Some(frame) = active.top_mut() {
            frame.bindings.push(binding);
        }
        Ok(())
    }

    /// Close the global declaration phase; later declarations are local.
    pub fn finish_declarations(&mut self) {
        self.declarations_done = true;
    }

    pub fn in_declaration_phase(&self) -> bool {
        !self.declarations_done
    }

    // ===== Scalar and element access =====

    pub fn read_scalar(&self, name: &str) -> InterpResult<i64> {
        match self.lookup(name)? {
            Value::Int(n) => Ok(n),
            Value::Array(None) => Err(RuntimeError::type_mismatch(
                name,
                "unallocated array used as an integer",
            )),
            Value::Array(Some(id)) => self.element(name, id, 0),
        }
    }

    pub fn write_scalar(&mut self, name: &str, value: i64) -> InterpResult<()> {
        match self.lookup(name)? {
            Value::Int(_) => self.set_value(name, Value::Int(value)),
            Value::Array(None) => Err(RuntimeError::type_mismatch(
                name,
                "unallocated array used as an integer",
            )),
            Value::Array(Some(id)) => self.set_element(name, id, 0, value),
        }
    }

    pub fn read_indexed(&self, name: &str, index: i64) -> InterpResult<i64> {
        let id = self.allocated_array(name)?;
        self.element(name, id, index)
    }

    pub fn write_indexed(&mut self, name: &str, index: i64, value: i64) -> InterpResult<()> {
        let id = self.allocated_array(name)?;
        self.set_element(name, id, index, value)
    }

    // ===== Array lifetime =====

    /// Point `name` at a fresh zeroed array of `size` elements.
    pub fn allocate_array(&mut self, name: &str, size: i64) -> InterpResult<()> {
        let previous = match self.lookup(name)? {
            Value::Int(_) => {
                return Err(RuntimeError::type_mismatch(name, "cannot allocate into an integer"));
            }
            Value::Array(id) => id,
        };
        let len = usize::try_from(size).map_err(|_| RuntimeError::negative_size(name, size))?;
        if len > self.max_array_len {
            return Err(RuntimeError::out_of_memory(name, len));
        }

        if let Some(old) = previous {
            self.release(old);
            self.set_value(name, Value::Array(None))?;
        }
        let id = self
            .heap
            .alloc(len)
            .ok_or_else(|| RuntimeError::out_of_memory(name, len))?;
        self.set_value(name, Value::Array(Some(id)))?;

        let live = self.heap.live();
        debug!(var = name, len, live, "allocate array");
        self.transcript.record(Event::Gc { live });
        Ok(())
    }

    /// Look up the array `name` refers to in the current scope.
    pub fn resolve_shared(&self, name: &str) -> InterpResult<SharedRef> {
        match self.lookup(name)? {
            Value::Array(id) => Ok(SharedRef(id)),
            Value::Int(_) => Err(RuntimeError::type_mismatch(name, "integer cannot be shared")),
        }
    }

    /// Rebind the array `lhs` to an already-resolved reference.
    ///
    /// The new referent is retained before the old one is released, so
    /// rebinding a name to the array it already holds never reclaims it.
    pub fn bind_resolved(&mut self, lhs: &str, shared: SharedRef) -> InterpResult<()> {
        let previous = match self.lookup(lhs)? {
            Value::Array(id) => id,
            Value::Int(_) => {
                return Err(RuntimeError::type_mismatch(lhs, "integer cannot hold an array"));
            }
        };

        if let Some(id) = shared.0 {
            self.heap.retain(id);
        }
        self.set_value(lhs, Value::Array(shared.0))?;
        if let Some(old) = previous {
            self.release(old);
        }
        trace!(var = lhs, target = ?shared.0, "bind shared");
        Ok(())
    }

    /// `lhs := array rhs`
    pub fn bind_shared(&mut self, lhs: &str, rhs: &str) -> InterpResult<()> {
        let shared = self.resolve_shared(rhs)?;
        self.bind_resolved(lhs, shared)
    }

    // ===== Frames =====

    pub fn push_frame(&mut self) {
        if let Some(active) = self.call_stack.active_mut() {
            active.frames.push(Frame::default());
            trace!(depth = active.frames.len(), "push frame");
        }
    }

    /// Leave the innermost block, releasing its arrays newest first.
    ///
    /// # Panics
    /// Panics when only the activation's base frame is left.
    pub fn pop_frame(&mut self) {
        let frame = match self.call_stack.active_mut() {
            Some(active) if active.frames.len() > 1 => active.frames.pop(),
            _ => panic!("Cannot pop the base frame of an activation"),
        };
        if let Some(frame) = frame {
            trace!(bindings = frame.len(), "pop frame");
            self.release_frame(frame);
        }
    }

    pub fn push_call_frame(&mut self) {
        self.call_stack.activations.push(FrameStack::new());
        trace!(depth = self.call_stack.depth(), "push call frame");
    }

    /// Leave a procedure activation, releasing every array it bound.
    ///
    /// # Panics
    /// Panics when called on the main activation.
    pub fn pop_call_frame(&mut self) {
        if self.call_stack.depth() <= 1 {
            panic!("Cannot pop the main activation");
        }
        if let Some(activation) = self.call_stack.activations.pop() {
            trace!(depth = self.call_stack.depth(), "pop call frame");
            self.release_activation(activation);
        }
    }

    /// Number of bindings in the innermost frame
    pub fn local_binding_count(&self) -> usize {
        self.call_stack
            .active()
            .and_then(FrameStack::top)
            .map_or(0, Frame::len)
    }

    /// Drop the newest binding of the innermost frame.
    pub fn pop_one_local_binding(&mut self) {
        let binding = self
            .call_stack
            .active_mut()
            .and_then(FrameStack::top_mut)
            .and_then(|frame| frame.bindings.pop());
        if let Some(binding) = binding {
            trace!(var = %binding.name, "drop loop binding");
            self.release_value(binding.value);
        }
    }

    /// Tear down every activation, then the globals newest first.
    ///
    /// Leaves an empty store with a fresh main activation.
    pub fn release_all(&mut self) {
        while let Some(activation) = self.call_stack.activations.pop() {
            self.release_activation(activation);
        }
        while let Some(binding) = self.globals.pop() {
            self.release_value(binding.value);
        }
        self.call_stack = CallStack::new();
        debug!(live = self.heap.live(), "released all bindings");
    }

    // ===== Transcript =====

    pub fn record_output(&mut self, value: i64) {
        self.transcript.record(Event::Output(value));
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn take_transcript(&mut self) -> Transcript {
        std::mem::take(&mut self.transcript)
    }

    // ===== Introspection =====

    pub fn live_objects(&self) -> usize {
        self.heap.live()
    }

    /// Kind of the binding `name` resolves to, if any
    pub fn kind_of(&self, name: &str) -> Option<VarKind> {
        self.binding(name).map(|b| b.value.kind())
    }

    /// Refcount of the array `name` refers to, `None` for integers and
    /// unallocated arrays
    pub fn refcount(&self, name: &str) -> Option<u32> {
        let id = self.lookup(name).ok()?.array_id()?;
        Some(self.heap.refcount(id))
    }

    /// Contents of the array `name` refers to
    pub fn array_contents(&self, name: &str) -> Option<&[i64]> {
        let id = self.lookup(name).ok()?.array_id()?;
        self.heap.get(id)
    }

    pub fn total_binding_count(&self) -> usize {
        self.globals.len()
            + self
                .call_stack
                .activations
                .iter()
                .map(FrameStack::binding_count)
                .sum::<usize>()
    }

    /// Number of activations, 1 while only main runs
    pub fn call_depth(&self) -> usize {
        self.call_stack.depth()
    }

    /// Number of frames in the innermost activation, including its base frame
    pub fn frame_depth(&self) -> usize {
        self.call_stack.active().map_or(0, |active| active.frames.len())
    }

    // ===== Internals =====

    fn binding(&self, name: &str) -> Option<&Binding> {
        self.call_stack
            .active()
            .and_then(|active| active.find(name))
            .or_else(|| self.globals.iter().find(|b| b.name == name))
    }

    fn lookup(&self, name: &str) -> InterpResult<Value> {
        self.binding(name)
            .map(|b| b.value)
            .ok_or_else(|| RuntimeError::undeclared_variable(name))
    }

    fn set_value(&mut self, name: &str, value: Value) -> InterpResult<()> {
        let Self {
            call_stack,
            globals,
            ..
        } = self;
        let binding = call_stack
            .active_mut()
            .and_then(|active| active.find_mut(name))
            .or_else(|| globals.iter_mut().find(|b| b.name == name))
            .ok_or_else(|| RuntimeError::undeclared_variable(name))?;
        binding.value = value;
        Ok(())
    }

    fn allocated_array(&self, name: &str) -> InterpResult<ArrayId> {
        match self.lookup(name)? {
            Value::Int(_) => Err(RuntimeError::type_mismatch(name, "integer cannot be indexed")),
            Value::Array(None) => Err(RuntimeError::array_not_initialized(name)),
            Value::Array(Some(id)) => Ok(id),
        }
    }

    fn element(&self, name: &str, id: ArrayId, index: i64) -> InterpResult<i64> {
        let data = self.heap.get(id).unwrap_or_default();
        usize::try_from(index)
            .ok()
            .and_then(|i| data.get(i).copied())
            .ok_or_else(|| RuntimeError::index_out_of_range(name, index, data.len()))
    }

    fn set_element(&mut self, name: &str, id: ArrayId, index: i64, value: i64) -> InterpResult<()> {
        let data = self.heap.get_mut(id).unwrap_or_default();
        match usize::try_from(index).ok().filter(|&i| i < data.len()) {
            Some(i) => {
                data[i] = value;
                Ok(())
            }
            None => Err(RuntimeError::index_out_of_range(name, index, data.len())),
        }
    }

    fn release(&mut self, id: ArrayId) {
        if let Some(live) = self.heap.release(id) {
            debug!(array = id.index(), live, "reclaim array");
            self.transcript.record(Event::Gc { live });
        }
    }

    fn release_value(&mut self, value: Value) {
        if let Some(id) = value.array_id() {
            self.release(id);
        }
    }

    fn release_frame(&mut self, frame: Frame) {
        for binding in frame.bindings.into_iter().rev() {
            self.release_value(binding.value);
        }
    }

    fn release_activation(&mut self, activation: FrameStack) {
        for frame in activation.frames.into_iter().rev() {
            self.release_frame(frame);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::error::ErrorKind;

    /// Store past its declaration phase with the given globals
    fn store_with(globals: &[(VarKind, &str)]) -> MemoryStore {
        let mut store = MemoryStore::new();
        for (kind, name) in globals {
            store.declare(*kind, name).unwrap();
        }
        store.finish_declarations();
        store
    }

    fn kind_of<T: std::fmt::Debug>(result: InterpResult<T>) -> ErrorKind {
        result.unwrap_err().kind
    }

    #[test]
    fn test_declare_defaults() {
        let store = store_with(&[(VarKind::Integer, "x"), (VarKind::Array, "a")]);
        assert_eq!(store.read_scalar("x").unwrap(), 0);
        assert_eq!(store.refcount("a"), None);
        assert_eq!(kind_of(store.read_scalar("a")), ErrorKind::TypeMismatch);
        assert_eq!(kind_of(store.read_indexed("a", 0)), ErrorKind::ArrayNotInitialized);
    }

    #[test]
    fn test_declaration_phase_flag() {
        let mut store = MemoryStore::new();
        assert!(store.in_declaration_phase());
        store.declare(VarKind::Integer, "x").unwrap();
        store.finish_declarations();
        assert!(!store.in_declaration_phase());

        // Later declarations land in main's frame, not among the globals
        store.declare(VarKind::Integer, "y").unwrap();
        assert_eq!(store.local_binding_count(), 1);
    }

    #[test]
    fn test_double_declaration() {
        let mut store = MemoryStore::new();
        store.declare(VarKind::Integer, "x").unwrap();
        assert_eq!(
            kind_of(store.declare(VarKind::Array, "x")),
            ErrorKind::DoubleDeclaration
        );

        store.finish_declarations();
        store.declare(VarKind::Integer, "x").unwrap(); // local shadows global
        assert_eq!(
            kind_of(store.declare(VarKind::Integer, "x")),
            ErrorKind::DoubleDeclaration
        );
    }

    #[test]
    fn test_double_declaration_scans_all_frames() {
        let mut store = store_with(&[]);
        store.declare(VarKind::Integer, "x").unwrap();
        store.push_frame();
        assert_eq!(
            kind_of(store.declare(VarKind::Integer, "x")),
            ErrorKind::DoubleDeclaration
        );
    }

    #[test]
    fn test_undeclared() {
        let mut store = store_with(&[]);
        assert_eq!(kind_of(store.read_scalar("nope")), ErrorKind::UndeclaredVariable);
        assert_eq!(kind_of(store.write_scalar("nope", 1)), ErrorKind::UndeclaredVariable);
        assert_eq!(kind_of(store.allocate_array("nope", 1)), ErrorKind::UndeclaredVariable);
        assert_eq!(kind_of(store.bind_shared("nope", "nope")), ErrorKind::UndeclaredVariable);
    }

    #[test]
    fn test_scalar_write_read() {
        let mut store = store_with(&[(VarKind::Integer, "x")]);
        store.write_scalar("x", 5).unwrap();
        assert_eq!(store.read_scalar("x").unwrap(), 5);
    }

    #[test]
    fn test_allocate_and_index() {
        let mut store = store_with(&[(VarKind::Array, "a")]);
        store.allocate_array("a", 3).unwrap();
        store.write_indexed("a", 2, 7).unwrap();
        assert_eq!(store.read_indexed("a", 2).unwrap(), 7);
        assert_eq!(store.array_contents("a"), Some(&[0, 0, 7][..]));
        assert_eq!(store.live_objects(), 1);
        assert_eq!(store.transcript().gc_counts(), vec![1]);
    }

    #[test]
    fn test_index_bounds() {
        let mut store = store_with(&[(VarKind::Array, "a")]);
        store.allocate_array("a", 3).unwrap();
        assert_eq!(kind_of(store.read_indexed("a", 3)), ErrorKind::IndexOutOfRange);
        assert_eq!(kind_of(store.read_indexed("a", -1)), ErrorKind::IndexOutOfRange);
        assert_eq!(kind_of(store.write_indexed("a", 5, 1)), ErrorKind::IndexOutOfRange);
    }

    #[test]
    fn test_indexing_integer_is_mismatch() {
        let store = store_with(&[(VarKind::Integer, "x")]);
        assert_eq!(kind_of(store.read_indexed("x", 0)), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_allocate_errors() {
        let mut store = store_with(&[(VarKind::Integer, "x"), (VarKind::Array, "a")]);
        assert_eq!(kind_of(store.allocate_array("x", 1)), ErrorKind::TypeMismatch);
        assert_eq!(kind_of(store.allocate_array("a", -2)), ErrorKind::IndexOutOfRange);
        assert_eq!(store.live_objects(), 0);
        assert!(store.transcript().is_empty());
    }

    #[test]
    fn test_allocation_over_limit_keeps_old_array() {
        let mut store = store_with(&[(VarKind::Array, "a")]).with_max_array_len(8);
        store.allocate_array("a", 8).unwrap();
        store.write_indexed("a", 7, 3).unwrap();

        assert_eq!(kind_of(store.allocate_array("a", 9)), ErrorKind::OutOfMemory);
        assert_eq!(store.read_indexed("a", 7).unwrap(), 3);
        assert_eq!(store.live_objects(), 1);
        assert_eq!(store.transcript().to_string(), "gc:1");
    }

    #[test]
    fn test_unreservable_allocation_is_an_error() {
        let mut store = store_with(&[(VarKind::Array, "a")]);
        store.allocate_array("a", 1).unwrap();
        let size = i64::MAX;
        assert_eq!(kind_of(store.allocate_array("a", size)), ErrorKind::OutOfMemory);
        // The old array was already released, so `a` is left unallocated
        assert_eq!(store.live_objects(), 0);
        assert_eq!(kind_of(store.read_indexed("a", 0)), ErrorKind::ArrayNotInitialized);
    }

    #[test]
    fn test_scalar_access_to_array_uses_element_zero() {
        let mut store = store_with(&[(VarKind::Array, "a")]);
        store.allocate_array("a", 2).unwrap();
        store.write_scalar("a", 9).unwrap();
        assert_eq!(store.read_indexed("a", 0).unwrap(), 9);
        assert_eq!(store.read_scalar("a").unwrap(), 9);

        store.allocate_array("a", 0).unwrap();
        assert_eq!(kind_of(store.read_scalar("a")), ErrorKind::IndexOutOfRange);
    }

    #[test]
    fn test_reallocation_releases_first() {
        let mut store = store_with(&[(VarKind::Array, "a")]);
        store.allocate_array("a", 1).unwrap();
        store.allocate_array("a", 2).unwrap();
        assert_eq!(store.transcript().to_string(), "gc:1 gc:0 gc:1");
        assert_eq!(store.live_objects(), 1);
        assert_eq!(store.array_contents("a").map(<[i64]>::len), Some(2));
    }

    #[test]
    fn test_sharing_aliases() {
        let mut store = store_with(&[(VarKind::Array, "a"), (VarKind::Array, "b")]);
        store.allocate_array("a", 2).unwrap();
        store.bind_shared("b", "a").unwrap();
        assert_eq!(store.refcount("a"), Some(2));

        store.write_indexed("b", 1, 4).unwrap();
        assert_eq!(store.read_indexed("a", 1).unwrap(), 4);
        store.write_indexed("a", 0, 8).unwrap();
        assert_eq!(store.read_indexed("b", 0).unwrap(), 8);
    }

    #[test]
    fn test_rebinding_breaks_alias() {
        let mut store = store_with(&[(VarKind::Array, "a"), (VarKind::Array, "b")]);
        store.allocate_array("a", 1).unwrap();
        store.bind_shared("b", "a").unwrap();
        store.allocate_array("b", 1).unwrap();
        assert_eq!(store.refcount("a"), Some(1));
        assert_eq!(store.refcount("b"), Some(1));

        store.write_indexed("b", 0, 3).unwrap();
        assert_eq!(store.read_indexed("a", 0).unwrap(), 0);
        // Reallocating b did not reclaim anything: gc:1 gc:2
        assert_eq!(store.transcript().gc_counts(), vec![1, 2]);
    }

    #[test]
    fn test_self_share_keeps_array() {
        let mut store = store_with(&[(VarKind::Array, "a")]);
        store.allocate_array("a", 1).unwrap();
        store.bind_shared("a", "a").unwrap();
        assert_eq!(store.refcount("a"), Some(1));
        assert_eq!(store.live_objects(), 1);
        assert_eq!(store.transcript().gc_counts(), vec![1]);
    }

    #[test]
    fn test_share_reclaims_old_target() {
        let mut store = store_with(&[(VarKind::Array, "a"), (VarKind::Array, "b")]);
        store.allocate_array("a", 1).unwrap();
        store.allocate_array("b", 1).unwrap();
        store.bind_shared("b", "a").unwrap();
        assert_eq!(store.transcript().gc_counts(), vec![1, 2, 1]);
        assert_eq!(store.refcount("a"), Some(2));
    }

    #[test]
    fn test_share_unallocated_then_integer() {
        let mut store = store_with(&[
            (VarKind::Array, "a"),
            (VarKind::Array, "b"),
            (VarKind::Integer, "n"),
        ]);
        store.allocate_array("b", 1).unwrap();
        // Sharing an unallocated array drops b's storage
        store.bind_shared("b", "a").unwrap();
        assert_eq!(store.live_objects(), 0);
        assert_eq!(store.refcount("b"), None);

        assert_eq!(kind_of(store.bind_shared("a", "n")), ErrorKind::TypeMismatch);
        assert_eq!(kind_of(store.bind_shared("n", "a")), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_frame_pop_releases_in_reverse() {
        let mut store = store_with(&[(VarKind::Array, "keep")]);
        store.allocate_array("keep", 1).unwrap();

        let before = store.total_binding_count();
        store.push_frame();
        store.declare(VarKind::Array, "x").unwrap();
        store.declare(VarKind::Array, "y").unwrap();
        store.declare(VarKind::Array, "alias").unwrap();
        store.allocate_array("x", 1).unwrap();
        store.allocate_array("y", 1).unwrap();
        store.bind_shared("alias", "keep").unwrap();
        store.pop_frame();

        assert_eq!(store.total_binding_count(), before);
        assert_eq!(store.refcount("keep"), Some(1));
        // alloc x, alloc y, then y reclaimed before x
        assert_eq!(store.transcript().gc_counts(), vec![1, 2, 3, 2, 1]);
        assert_eq!(kind_of(store.read_scalar("x")), ErrorKind::UndeclaredVariable);
    }

    #[test]
    fn test_frames_shadow_globals() {
        let mut store = store_with(&[(VarKind::Integer, "x")]);
        store.write_scalar("x", 1).unwrap();
        store.push_frame();
        store.declare(VarKind::Integer, "x").unwrap();
        store.write_scalar("x", 2).unwrap();
        assert_eq!(store.read_scalar("x").unwrap(), 2);
        store.pop_frame();
        assert_eq!(store.read_scalar("x").unwrap(), 1);
    }

    #[test]
    fn test_call_frame_hides_caller_locals() {
        let mut store = store_with(&[(VarKind::Integer, "g")]);
        store.declare(VarKind::Integer, "local").unwrap();
        store.push_call_frame();
        assert_eq!(store.call_depth(), 2);
        assert_eq!(kind_of(store.read_scalar("local")), ErrorKind::UndeclaredVariable);
        assert!(store.read_scalar("g").is_ok());
        // Same name is free in the new activation
        store.declare(VarKind::Integer, "local").unwrap();
        store.pop_call_frame();
        assert_eq!(store.call_depth(), 1);
        assert!(store.read_scalar("local").is_ok());
    }

    #[test]
    fn test_resolve_before_push_for_calls() {
        let mut store = store_with(&[]);
        store.declare(VarKind::Array, "a").unwrap();
        store.allocate_array("a", 1).unwrap();

        let arg = store.resolve_shared("a").unwrap();
        store.push_call_frame();
        store.declare(VarKind::Array, "x").unwrap();
        store.bind_resolved("x", arg).unwrap();
        store.write_indexed("x", 0, 1).unwrap();
        assert_eq!(store.refcount("x"), Some(2));
        store.pop_call_frame();

        assert_eq!(store.read_indexed("a", 0).unwrap(), 1);
        assert_eq!(store.refcount("a"), Some(1));
        assert_eq!(store.live_objects(), 1);
    }

    #[test]
    fn test_call_frame_pop_reclaims_callee_arrays() {
        let mut store = store_with(&[]);
        let before = store.total_binding_count();
        store.push_call_frame();
        store.declare(VarKind::Array, "tmp").unwrap();
        store.allocate_array("tmp", 4).unwrap();
        store.push_frame();
        store.declare(VarKind::Array, "inner").unwrap();
        store.allocate_array("inner", 1).unwrap();
        store.pop_call_frame();

        assert_eq!(store.total_binding_count(), before);
        assert_eq!(store.transcript().gc_counts(), vec![1, 2, 1, 0]);
    }

    #[test]
    fn test_loop_truncation() {
        let mut store = store_with(&[]);
        store.push_frame();
        let mark = store.local_binding_count();
        store.declare(VarKind::Array, "t").unwrap();
        store.allocate_array("t", 1).unwrap();
        while store.local_binding_count() > mark {
            store.pop_one_local_binding();
        }
        assert_eq!(store.local_binding_count(), 0);
        assert_eq!(store.live_objects(), 0);
        // Redeclaring after truncation is allowed
        store.declare(VarKind::Array, "t").unwrap();
        store.pop_frame();
    }

    #[test]
    fn test_release_all() {
        let mut store = store_with(&[(VarKind::Array, "g1"), (VarKind::Array, "g2")]);
        store.allocate_array("g1", 1).unwrap();
        store.allocate_array("g2", 1).unwrap();
        store.declare(VarKind::Array, "m").unwrap();
        store.allocate_array("m", 1).unwrap();
        store.push_call_frame();
        store.declare(VarKind::Array, "p").unwrap();
        store.bind_shared("p", "g1").unwrap();

        store.release_all();
        assert_eq!(store.live_objects(), 0);
        assert_eq!(store.total_binding_count(), 0);
        assert_eq!(store.call_depth(), 1);
        // m (main) reclaimed, then g2, then g1 (p dropped its share first)
        assert_eq!(store.transcript().gc_counts(), vec![1, 2, 3, 2, 1, 0]);
    }

    #[test]
    fn test_frame_depth() {
        let mut store = store_with(&[]);
        assert_eq!(store.frame_depth(), 1);
        store.push_frame();
        store.push_frame();
        assert_eq!(store.frame_depth(), 3);
        store.push_call_frame();
        assert_eq!(store.frame_depth(), 1);
        store.pop_call_frame();
        store.pop_frame();
        store.pop_frame();
        assert_eq!(store.frame_depth(), 1);
    }

    #[test]
    #[should_panic(expected = "Cannot pop the main activation")]
    fn test_pop_main_panics() {
        let mut store = store_with(&[]);
        store.pop_call_frame();
    }

    #[test]
    #[should_panic(expected = "Cannot pop the base frame")]
    fn test_pop_base_frame_panics() {
        let mut store = store_with(&[]);
        store.pop_frame();
    }

    #[test]
    fn test_outputs_interleave_with_gc() {
        let mut store = store_with(&[(VarKind::Array, "a")]);
        store.record_output(3);
        store.allocate_array("a", 1).unwrap();
        store.record_output(4);
        assert_eq!(store.transcript().to_string(), "3 gc:1 4");
        let taken = store.take_transcript();
        assert_eq!(taken.len(), 3);
        assert!(store.transcript().is_empty());
    }
}
