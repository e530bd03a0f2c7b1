use std::collections::VecDeque;

/// FIFO of tasks that become runnable once the surface clock reaches their due time.
#[derive(Debug)]
pub struct DeferredQueue<T> {
	tasks: VecDeque<(f64, T)>,
}

impl<T> Default for DeferredQueue<T> {
	fn default() -> Self {
		Self {
			tasks: VecDeque::new(),
		}
	}
}

impl<T> DeferredQueue<T> {
	pub fn schedule(&mut self, due_ms: f64, task: T) {
		self.tasks.push_back((due_ms, task));
	}

	/// Remove and return every task due at `now_ms`, in scheduling order.
	pub fn take_due(&mut self, now_ms: f64) -> Vec<T> {
		let mut due = Vec::new();
		let mut pending = VecDeque::with_capacity(self.tasks.len());
		for (at, task) in self.tasks.drain(..) {
			if at <= now_ms {
				due.push(task);
			} else {
				pending.push_back((at, task));
			}
		}
		self.tasks = pending;
		due
	}

	pub fn is_empty(&self) -> bool {
		self.tasks.is_empty()
	}

	#[cfg(test)]
	pub fn len(&self) -> usize {
		self.tasks.len()
	}
}
