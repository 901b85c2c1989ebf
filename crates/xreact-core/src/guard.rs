//! Cyclic access guard.
//!
//! Every dependency link owns a [`CyclicAccessGuard`]. A link handler steps into the guard before it
//! propagates a notification and steps out afterwards; when a notification storm re-enters the same
//! link more often than allowed, the guard rejects the entrance and reports the chain of accesses
//! that led there.
//!
//! ## Example
//!
//! ```ignore
//! use xreact_core::guard::{CyclicAccessGuard, shared_record};
//!
//! let record = shared_record();
//! let guard = CyclicAccessGuard::new(1, Some(record));
//!
//! let scope = guard.enter(trace.clone())?; // first entrance
//! assert!(guard.enter(trace).is_err()); // re-entrance is rejected
//! drop(scope);
//! ```

use core::cell::Cell;
use core::fmt;
use core::fmt::Write as _;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::warn;

use crate::error::{ReactorError, ReactorResult};
use crate::notify::ObjectId;

/// Situation in which a dependency link was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessContext {
	ParentPropertyChanged,
	TargetPropertyChanged,
	CollectionChanged,
	CollectionItemChanged,
}

impl fmt::Display for AccessContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::ParentPropertyChanged => "ParentPropertyChanged",
			Self::TargetPropertyChanged => "TargetPropertyChanged",
			Self::CollectionChanged => "CollectionChanged",
			Self::CollectionItemChanged => "CollectionItemChanged",
		};
		f.write_str(name)
	}
}

/// One entry of the access record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTrace {
	pub context: AccessContext,
	pub sender: ObjectId,
	pub property_name: Option<String>,
}

impl AccessTrace {
	pub fn new(context: AccessContext, sender: ObjectId, property_name: Option<&str>) -> Self {
		Self {
			context,
			sender,
			property_name: property_name.map(str::to_owned),
		}
	}
}

impl fmt::Display for AccessTrace {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let property = match self.property_name.as_deref() {
			None | Some("") => "<all>",
			Some(name) => name,
		};
		write!(f, "{} {} on object {}", self.context, property, self.sender)
	}
}

/// Stack of accesses currently in progress, plus the last rejected one.
#[derive(Debug)]
pub struct CyclicAccessRecord<T> {
	stack: Vec<T>,
	interrupted: Option<T>,
}

impl<T> Default for CyclicAccessRecord<T> {
	fn default() -> Self {
		Self {
			stack: Vec::new(),
			interrupted: None,
		}
	}
}

impl<T: fmt::Display> CyclicAccessRecord<T> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record_step_in(&mut self, trace: T) {
		self.stack.push(trace);
	}

	/// Remember a rejected entrance until the next step-out.
	///
	/// Fails when a previous rejection has not been stepped out from yet.
	pub fn record_interrupted(&mut self, trace: T) -> ReactorResult<()> {
		if self.interrupted.is_some() {
			return Err(ReactorError::InvalidOperation(
				"interrupted access trace has already been set; \
				 the current context must be stepped out from first"
					.into(),
			));
		}
		self.interrupted = Some(trace);
		Ok(())
	}

	/// Leave the innermost context. A pending interrupted trace is cleared before the stack is
	/// popped.
	pub fn step_out(&mut self) -> Option<T> {
		self.interrupted.take().or_else(|| self.stack.pop())
	}

	pub fn depth(&self) -> usize {
		self.stack.len()
	}

	pub fn has_interrupted(&self) -> bool {
		self.interrupted.is_some()
	}

	pub fn clear(&mut self) {
		self.stack.clear();
		self.interrupted = None;
	}

	/// Render the access layers, outermost first.
	pub fn report(&self) -> String {
		self.render(self.interrupted.as_ref())
	}

	/// Render the access layers as if `interrupted` had been rejected last.
	pub fn report_with(&self, interrupted: &T) -> String {
		self.render(Some(interrupted))
	}

	fn render(&self, interrupted: Option<&T>) -> String {
		let mut report = String::from("Access layers:\n");
		for trace in &self.stack {
			let _ = writeln!(report, "-> {trace}");
		}
		if let Some(trace) = interrupted {
			let _ = writeln!(report, "-> (interrupted) {trace}");
		}
		report
	}
}

/// Access record shared by all guards of one configuration.
pub type SharedAccessRecord<T = AccessTrace> = Arc<Mutex<CyclicAccessRecord<T>>>;

static GLOBAL_RECORD: Lazy<SharedAccessRecord> = Lazy::new(shared_record);

/// Create an empty shared record.
pub fn shared_record<T>() -> SharedAccessRecord<T> {
	Arc::new(Mutex::new(CyclicAccessRecord::default()))
}

/// Process-wide access record used by [`ReactorConfig::global`](crate::ReactorConfig::global).
pub fn global_record() -> SharedAccessRecord {
	Arc::clone(&GLOBAL_RECORD)
}

/// Counts nested entrances into one dependency link.
pub struct CyclicAccessGuard<T = AccessTrace> {
	cycle_count: Cell<u32>,
	allowed_cycles: u32,
	interrupted_pending: Cell<bool>,
	record: Option<SharedAccessRecord<T>>,
}

impl<T: fmt::Display> CyclicAccessGuard<T> {
	/// # Arguments
	///
	/// * `allowed_cycles` - Number of nested entrances allowed at the same time.
	/// * `record` - Optional record receiving a trace for every entrance.
	pub fn new(allowed_cycles: u32, record: Option<SharedAccessRecord<T>>) -> Self {
		Self {
			cycle_count: Cell::new(0),
			allowed_cycles,
			interrupted_pending: Cell::new(false),
			record,
		}
	}

	pub fn cycle_count(&self) -> u32 {
		self.cycle_count.get()
	}

	pub fn allowed_cycles(&self) -> u32 {
		self.allowed_cycles
	}

	fn is_exhausted(&self) -> bool {
		self.cycle_count.get() >= self.allowed_cycles
	}

	fn record_entrance(&self, trace: T) {
		self.cycle_count.set(self.cycle_count.get() + 1);
		if let Some(record) = &self.record {
			record.lock().record_step_in(trace);
		}
	}

	/// Step in, or record the rejected trace and return `false`.
	///
	/// A rejected attempt must still be followed by a step-out, which clears the interrupted slot.
	pub fn try_step_in(&self, trace: T) -> bool {
		if !self.is_exhausted() {
			self.record_entrance(trace);
			return true;
		}
		if let Some(record) = &self.record
			&& let Err(err) = record.lock().record_interrupted(trace)
		{
			warn!(error = %err, "interrupted access trace was not recorded");
		}
		self.interrupted_pending.set(true);
		false
	}

	/// Step in, or fail with [`ReactorError::CyclicAccess`].
	///
	/// A rejected attempt leaves no state behind and must not be stepped out from.
	pub fn step_in_or_throw(&self, trace: T) -> ReactorResult<()> {
		if !self.is_exhausted() {
			self.record_entrance(trace);
			return Ok(());
		}
		let report = self
			.record
			.as_ref()
			.map(|record| record.lock().report_with(&trace))
			.unwrap_or_default();
		Err(ReactorError::CyclicAccess {
			message: format!(
				"Operation cannot proceed, because access is guarded against cyclic reference. \
				 Possible cyclic reference has been detected: all {allowed} of {allowed} recursive \
				 entrances allowed have been made.\n{report}",
				allowed = self.allowed_cycles
			),
		})
	}

	/// Step out. Returns `false` when there was nothing to step out from.
	pub fn try_step_out(&self) -> bool {
		if self.interrupted_pending.replace(false) {
			if let Some(record) = &self.record {
				record.lock().step_out();
			}
			return true;
		}
		let count = self.cycle_count.get();
		if count == 0 {
			return false;
		}
		self.cycle_count.set(count - 1);
		if let Some(record) = &self.record {
			record.lock().step_out();
		}
		true
	}

	/// Step out, or fail with [`ReactorError::InvalidOperation`] when there was no matching step-in.
	pub fn step_out_or_throw(&self) -> ReactorResult<()> {
		if self.try_step_out() {
			Ok(())
		} else {
			Err(ReactorError::InvalidOperation(
				"attempted to step out of a cyclic access guard without a corresponding step-in".into(),
			))
		}
	}

	/// Step in and return a scope that steps out when dropped.
	pub fn enter(&self, trace: T) -> ReactorResult<GuardScope<'_, T>> {
		self.step_in_or_throw(trace)?;
		Ok(GuardScope { guard: self })
	}
}

impl<T> fmt::Debug for CyclicAccessGuard<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CyclicAccessGuard")
			.field("cycle_count", &self.cycle_count.get())
			.field("allowed_cycles", &self.allowed_cycles)
			.field("has_record", &self.record.is_some())
			.finish()
	}
}

/// Active entrance into a [`CyclicAccessGuard`].
#[must_use = "dropping the scope steps out of the guard immediately"]
pub struct GuardScope<'a, T: fmt::Display = AccessTrace> {
	guard: &'a CyclicAccessGuard<T>,
}

impl<T: fmt::Display> Drop for GuardScope<'_, T> {
	fn drop(&mut self) {
		self.guard.try_step_out();
	}
}

/// Record-only scope used where notifications are traced but not guarded.
#[must_use = "dropping the scope steps out of the record immediately"]
pub struct RecordScope<'a, T: fmt::Display = AccessTrace> {
	record: &'a SharedAccessRecord<T>,
}

impl<'a, T: fmt::Display> RecordScope<'a, T> {
	pub fn enter(record: &'a SharedAccessRecord<T>, trace: T) -> Self {
		record.lock().record_step_in(trace);
		Self { record }
	}
}

impl<T: fmt::Display> Drop for RecordScope<'_, T> {
	fn drop(&mut self) {
		self.record.lock().step_out();
	}
}
