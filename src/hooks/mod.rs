// Hook system - fixed, synchronous extension points
//
// Each extension point has a declared payload type and composition. Taps run
// in registration order; the first failing tap aborts the build.

use crate::compilation::Compilation;
use crate::compiler::{AssetPathData, CompilationParams, Compiler, Stats};
use crate::error::BundleError;
use serde::Serialize;
use std::fmt;

/// How the taps of a hook are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Composition {
    /// Every tap observes the same payload
    Series,
    /// Each tap receives the previous tap's result
    Waterfall,
}

/// The extension points of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HookKind {
    /// A build starts, before any entry is resolved
    Run,
    /// A fresh compilation was created
    Compilation,
    /// Output path of a chunk is computed (compilation-scoped)
    AssetPath,
    /// Assets are rendered but nothing is written yet
    Emit,
    /// Every asset has been written
    Done,
}

impl HookKind {
    pub const ALL: [HookKind; 5] = [
        HookKind::Run,
        HookKind::Compilation,
        HookKind::AssetPath,
        HookKind::Emit,
        HookKind::Done,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HookKind::Run => "run",
            HookKind::Compilation => "compilation",
            HookKind::AssetPath => "assetPath",
            HookKind::Emit => "emit",
            HookKind::Done => "done",
        }
    }

    pub fn composition(&self) -> Composition {
        match self {
            HookKind::AssetPath => Composition::Waterfall,
            _ => Composition::Series,
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type RunFn = dyn Fn(&Compiler) -> anyhow::Result<()>;
pub type CompilationFn = dyn Fn(&mut Compilation, &CompilationParams) -> anyhow::Result<()>;
pub type AssetPathFn = dyn Fn(String, &AssetPathData) -> anyhow::Result<String>;
pub type EmitFn = dyn Fn(&mut Compilation) -> anyhow::Result<()>;
pub type DoneFn = dyn Fn(&Stats) -> anyhow::Result<()>;

struct Tap<F: ?Sized> {
    name: String,
    callback: Box<F>,
}

/// Ordered, named taps for one extension point
pub struct Hook<F: ?Sized> {
    kind: HookKind,
    taps: Vec<Tap<F>>,
}

impl<F: ?Sized> Hook<F> {
    pub fn new(kind: HookKind) -> Self {
        Self {
            kind,
            taps: Vec::new(),
        }
    }

    /// Tap names in registration (and execution) order
    pub fn tap_names(&self) -> impl Iterator<Item = &str> {
        self.taps.iter().map(|tap| tap.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    fn push(&mut self, name: impl Into<String>, callback: Box<F>) {
        let name = name.into();
        tracing::trace!(
            hook = %self.kind,
            composition = ?self.kind.composition(),
            tap = %name,
            "tap registered"
        );
        self.taps.push(Tap { name, callback });
    }

    fn fail(&self, tap: &Tap<F>, error: anyhow::Error) -> BundleError {
        BundleError::Hook {
            hook: self.kind.name(),
            tap: tap.name.clone(),
            message: format!("{error:#}"),
        }
    }

    fn trace_call(&self, tap: &Tap<F>) {
        tracing::trace!(hook = %self.kind, tap = %tap.name, "calling tap");
    }
}

impl<F: ?Sized> fmt::Debug for Hook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("kind", &self.kind)
            .field("composition", &self.kind.composition())
            .field("taps", &self.tap_names().collect::<Vec<_>>())
            .finish()
    }
}

impl Hook<RunFn> {
    pub fn tap<C>(&mut self, name: impl Into<String>, callback: C)
    where
        C: Fn(&Compiler) -> anyhow::Result<()> + 'static,
    {
        self.push(name, Box::new(callback));
    }

    pub fn call(&self, compiler: &Compiler) -> Result<(), BundleError> {
        for tap in &self.taps {
            self.trace_call(tap);
            (tap.callback)(compiler).map_err(|e| self.fail(tap, e))?;
        }
        Ok(())
    }
}

impl Hook<CompilationFn> {
    pub fn tap<C>(&mut self, name: impl Into<String>, callback: C)
    where
        C: Fn(&mut Compilation, &CompilationParams) -> anyhow::Result<()> + 'static,
    {
        self.push(name, Box::new(callback));
    }

    pub fn call(
        &self,
        compilation: &mut Compilation,
        params: &CompilationParams,
    ) -> Result<(), BundleError> {
        for tap in &self.taps {
            self.trace_call(tap);
            (tap.callback)(compilation, params).map_err(|e| self.fail(tap, e))?;
        }
        Ok(())
    }
}

impl Hook<AssetPathFn> {
    pub fn tap<C>(&mut self, name: impl Into<String>, callback: C)
    where
        C: Fn(String, &AssetPathData) -> anyhow::Result<String> + 'static,
    {
        self.push(name, Box::new(callback));
    }

    /// Thread `path` through every tap and return the final value
    pub fn call(&self, path: String, data: &AssetPathData) -> Result<String, BundleError> {
        let mut path = path;
        for tap in &self.taps {
            self.trace_call(tap);
            path = (tap.callback)(path, data).map_err(|e| self.fail(tap, e))?;
        }
        Ok(path)
    }
}

impl Hook<EmitFn> {
    pub fn tap<C>(&mut self, name: impl Into<String>, callback: C)
    where
        C: Fn(&mut Compilation) -> anyhow::Result<()> + 'static,
    {
        self.push(name, Box::new(callback));
    }

    pub fn call(&self, compilation: &mut Compilation) -> Result<(), BundleError> {
        for tap in &self.taps {
            self.trace_call(tap);
            (tap.callback)(compilation).map_err(|e| self.fail(tap, e))?;
        }
        Ok(())
    }
}

impl Hook<DoneFn> {
    pub fn tap<C>(&mut self, name: impl Into<String>, callback: C)
    where
        C: Fn(&Stats) -> anyhow::Result<()> + 'static,
    {
        self.push(name, Box::new(callback));
    }

    pub fn call(&self, stats: &Stats) -> Result<(), BundleError> {
        for tap in &self.taps {
            self.trace_call(tap);
            (tap.callback)(stats).map_err(|e| self.fail(tap, e))?;
        }
        Ok(())
    }
}

/// Process-scoped hooks, owned by the [`Compiler`]
#[derive(Debug)]
pub struct CompilerHooks {
    pub run: Hook<RunFn>,
    pub compilation: Hook<CompilationFn>,
    pub emit: Hook<EmitFn>,
    pub done: Hook<DoneFn>,
}

impl Default for CompilerHooks {
    fn default() -> Self {
        Self {
            run: Hook::new(HookKind::Run),
            compilation: Hook::new(HookKind::Compilation),
            emit: Hook::new(HookKind::Emit),
            done: Hook::new(HookKind::Done),
        }
    }
}

/// Hooks scoped to one [`Compilation`]
#[derive(Debug)]
pub struct CompilationHooks {
    pub asset_path: Hook<AssetPathFn>,
}

impl Default for CompilationHooks {
    fn default() -> Self {
        Self {
            asset_path: Hook::new(HookKind::AssetPath),
        }
    }
}
