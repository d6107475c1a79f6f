//! Render context manager
//!
//! Tracks which render context drawing code targets.
//!
//! - **Per thread**: the current context, the current window and a stack of
//!   saved bindings, so scopes nest
//! - **Per process**: a `window → context` map behind one mutex, in
//!   registration order
//!
//! # Resolution
//!
//! [`get_render_context`] resolves in this order:
//!
//! 1. the thread's current context
//! 2. the context registered for the thread's current window, which then
//!    becomes the current context
//! 3. the first registered context
//! 4. nothing; the [`draw`](crate::draw) helpers become no-ops
//!
//! While a render pass holds a context through [`with_active_context`],
//! helpers that resolve to that context draw through the pass instead of
//! locking it again.
//!
//! # Example
//!
//! ```ignore
//! let _scope = WindowRenderScope::new(window.id());
//! draw::set_fill_color(Color::RED);
//! draw::fill_rectangle(Rect2Df::new(0.0, 0.0, 10.0, 10.0));
//! ```

use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use indexmap::IndexMap;
use tracing::{debug, trace, warn};
use uc_core::{RenderContext, WindowId};

/// A render context shared between its window and the manager
pub type SharedContext = Arc<Mutex<Box<dyn RenderContext + Send>>>;

/// Wrap a backend context for registration
pub fn share_context(context: Box<dyn RenderContext + Send>) -> SharedContext {
    Arc::new(Mutex::new(context))
}

static WINDOW_CONTEXTS: OnceLock<Mutex<IndexMap<WindowId, SharedContext>>> = OnceLock::new();

fn window_contexts() -> MutexGuard<'static, IndexMap<WindowId, SharedContext>> {
    WINDOW_CONTEXTS
        .get_or_init(|| Mutex::new(IndexMap::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Clone, Default)]
struct Binding {
    window: Option<WindowId>,
    context: Option<SharedContext>,
}

thread_local! {
    static CURRENT: RefCell<Binding> = RefCell::new(Binding::default());
    static STACK: RefCell<Vec<Binding>> = const { RefCell::new(Vec::new()) };
    /// Contexts locked by this thread, by address
    static HELD: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
    /// Context held by the running render pass
    static ACTIVE: Cell<Option<ActiveContext>> = const { Cell::new(None) };
}

type ContextPtr = *mut (dyn RenderContext + Send);

#[derive(Clone, Copy)]
struct ActiveContext {
    key: usize,
    ptr: ContextPtr,
}

fn context_key(context: &SharedContext) -> usize {
    Arc::as_ptr(context) as usize
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

pub fn register_window_context(window: WindowId, context: SharedContext) {
    debug!(?window, "render context registered");
    window_contexts().insert(window, context);
}

/// Remove a window's context; bindings to it on this thread are dropped,
/// saved ones included
pub fn unregister_window_context(window: WindowId) -> Option<SharedContext> {
    let removed = window_contexts().shift_remove(&window);
    if let Some(removed) = removed.as_ref() {
        let key = context_key(removed);
        let forget = |binding: &mut Binding| {
            if binding.context.as_ref().map(context_key) == Some(key) {
                binding.context = None;
            }
        };
        CURRENT.with(|current| forget(&mut *current.borrow_mut()));
        STACK.with(|stack| stack.borrow_mut().iter_mut().for_each(forget));
        debug!(?window, "render context unregistered");
    }
    removed
}

pub fn context_for_window(window: WindowId) -> Option<SharedContext> {
    window_contexts().get(&window).cloned()
}

pub fn registered_windows() -> Vec<WindowId> {
    window_contexts().keys().copied().collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Thread-local binding
// ─────────────────────────────────────────────────────────────────────────────

pub fn current_window() -> Option<WindowId> {
    CURRENT.with(|current| current.borrow().window)
}

/// Number of saved bindings on this thread
pub fn scope_depth() -> usize {
    STACK.with(|stack| stack.borrow().len())
}

/// Resolve the context drawing code should target
pub fn get_render_context() -> Option<SharedContext> {
    let binding = CURRENT.with(|current| current.borrow().clone());
    if let Some(context) = binding.context {
        return Some(context);
    }
    if let Some(window) = binding.window {
        if let Some(context) = context_for_window(window) {
            CURRENT.with(|current| current.borrow_mut().context = Some(context.clone()));
            return Some(context);
        }
    }
    window_contexts().values().next().cloned()
}

fn push_binding(binding: Binding) {
    let previous = CURRENT.with(|current| current.replace(binding));
    STACK.with(|stack| stack.borrow_mut().push(previous));
}

fn pop_binding() {
    let previous = STACK.with(|stack| stack.borrow_mut().pop());
    match previous {
        Some(previous) => CURRENT.with(|current| *current.borrow_mut() = previous),
        None => warn!("render scope stack underflow"),
    }
}

fn bind(context: &SharedContext) {
    if let Some(mut held) = lock_context(context) {
        held.on_bind();
    }
}

/// Binds a window and its context for the lifetime of the guard
#[must_use = "the binding ends when the scope is dropped"]
pub struct WindowRenderScope {
    window: WindowId,
    _not_send: PhantomData<*const ()>,
}

impl WindowRenderScope {
    pub fn new(window: WindowId) -> Self {
        let context = context_for_window(window);
        if context.is_none() {
            debug!(?window, "render scope for a window without a context");
        }
        if let Some(context) = context.as_ref() {
            bind(context);
        }
        push_binding(Binding {
            window: Some(window),
            context,
        });
        trace!(?window, "window render scope entered");
        Self {
            window,
            _not_send: PhantomData,
        }
    }

    pub fn window(&self) -> WindowId {
        self.window
    }
}

impl Drop for WindowRenderScope {
    fn drop(&mut self) {
        pop_binding();
        trace!(window = ?self.window, "window render scope left");
    }
}

/// Binds a context without changing the current window
#[must_use = "the binding ends when the scope is dropped"]
pub struct RenderContextScope {
    _not_send: PhantomData<*const ()>,
}

impl RenderContextScope {
    pub fn new(context: SharedContext) -> Self {
        bind(&context);
        push_binding(Binding {
            window: current_window(),
            context: Some(context),
        });
        Self {
            _not_send: PhantomData,
        }
    }
}

impl Drop for RenderContextScope {
    fn drop(&mut self) {
        pop_binding();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Locking
// ─────────────────────────────────────────────────────────────────────────────

/// Exclusive access to a shared context
///
/// Locking a context this thread already holds returns `None` instead of
/// deadlocking. Draw helpers called during a render pass reach the held
/// context through [`with_active_context`] instead.
pub struct HeldContext<'a> {
    guard: MutexGuard<'a, Box<dyn RenderContext + Send>>,
    key: usize,
}

pub fn lock_context(context: &SharedContext) -> Option<HeldContext<'_>> {
    let key = context_key(context);
    if HELD.with(|held| held.borrow().contains(&key)) {
        warn!("render context already in use on this thread");
        return None;
    }
    let guard = context
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    HELD.with(|held| held.borrow_mut().push(key));
    Some(HeldContext { guard, key })
}

impl Deref for HeldContext<'_> {
    type Target = dyn RenderContext + Send;

    fn deref(&self) -> &Self::Target {
        &**self.guard
    }
}

impl DerefMut for HeldContext<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut **self.guard
    }
}

impl Drop for HeldContext<'_> {
    fn drop(&mut self) {
        HELD.with(|held| held.borrow_mut().retain(|&k| k != self.key));
    }
}

/// Run `f` on the resolved context; `None` if there is none
pub fn with_render_context<R>(f: impl FnOnce(&mut dyn RenderContext) -> R) -> Option<R> {
    let Some(context) = get_render_context() else {
        trace!("no render context, draw call ignored");
        return None;
    };
    let key = context_key(&context);
    if let Some(active) = ACTIVE.with(Cell::get).filter(|a| a.key == key) {
        // taken while `f` runs so a nested helper cannot alias it
        let _restore = RestoreActive(ACTIVE.with(|a| a.replace(None)));
        // SAFETY: `with_active_context` keeps the pointee locked and alive
        // while the slot is set, and the slot is cleared for the duration
        // of `f`, so this is the only reference made from it.
        let ctx = unsafe { &mut *active.ptr };
        return Some(f(ctx));
    }
    let mut held = lock_context(&context)?;
    let ctx: &mut (dyn RenderContext + Send) = &mut *held;
    Some(f(ctx))
}

/// Run `f` on a held context and expose it to the draw helpers meanwhile
///
/// Element code calling [`draw`](crate::draw) helpers inside `f` draws on
/// `held` when the helpers resolve to the same context.
pub fn with_active_context<R>(
    held: &mut HeldContext<'_>,
    f: impl FnOnce(&mut (dyn RenderContext + Send)) -> R,
) -> R {
    let ptr: ContextPtr = &mut **held.guard;
    let active = ActiveContext { key: held.key, ptr };
    let _restore = RestoreActive(ACTIVE.with(|a| a.replace(Some(active))));
    // SAFETY: `ptr` comes from the guard borrowed for this whole call, so
    // the context stays locked and alive until `_restore` clears the slot.
    let ctx = unsafe { &mut *ptr };
    f(ctx)
}

/// Puts the previous active context back, also on unwind
struct RestoreActive(Option<ActiveContext>);

impl Drop for RestoreActive {
    fn drop(&mut self) {
        ACTIVE.with(|a| a.set(self.0.take()));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// State guard
// ─────────────────────────────────────────────────────────────────────────────

/// Pushes a render state on creation and pops back on drop
///
/// Frames pushed without a matching pop inside the guard are discarded too,
/// including when the body unwinds.
pub struct RenderStateGuard<'a> {
    ctx: &'a mut dyn RenderContext,
    depth: usize,
}

impl<'a> RenderStateGuard<'a> {
    pub fn new(ctx: &'a mut dyn RenderContext) -> Self {
        let depth = ctx.state_depth();
        ctx.push_state();
        Self { ctx, depth }
    }
}

impl<'a> Deref for RenderStateGuard<'a> {
    type Target = dyn RenderContext + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.ctx
    }
}

impl<'a> DerefMut for RenderStateGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.ctx
    }
}

impl Drop for RenderStateGuard<'_> {
    fn drop(&mut self) {
        while self.ctx.state_depth() > self.depth {
            self.ctx.pop_state();
        }
    }
}
