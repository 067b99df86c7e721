use crossbeam_channel::{Receiver, Sender};

/// Work queue for state that lives on the main thread.
///
/// Other threads post closures through a [`MainHandle`]; the owning thread
/// runs them against its `T` with [`MainQueue::run_pending`]. `T` itself never
/// crosses threads.
pub struct MainQueue<T: ?Sized + 'static> {
    tx: Sender<Box<dyn FnOnce(&mut T) + Send>>,
    rx: Receiver<Box<dyn FnOnce(&mut T) + Send>>,
}

impl<T: ?Sized + 'static> MainQueue<T> {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    pub fn handle(&self) -> MainHandle<T> {
        MainHandle {
            tx: self.tx.clone(),
        }
    }

    /// Runs every task queued so far, in posting order. Returns how many ran.
    pub fn run_pending(&self, target: &mut T) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task(target);
            ran += 1;
        }
        ran
    }
}

impl<T: ?Sized + 'static> Default for MainQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable sender side of a [`MainQueue`].
pub struct MainHandle<T: ?Sized + 'static> {
    tx: Sender<Box<dyn FnOnce(&mut T) + Send>>,
}

impl<T: ?Sized + 'static> MainHandle<T> {
    /// Posts a task to the main thread.
    ///
    /// Returns `false` once the queue has been torn down; the task is dropped.
    pub fn dispatch<F>(&self, task: F) -> bool
    where
        F: FnOnce(&mut T) + Send + 'static,
    {
        self.tx.send(Box::new(task)).is_ok()
    }
}

impl<T: ?Sized + 'static> Clone for MainHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_tasks_run_in_posting_order() {
        let queue: MainQueue<Vec<u32>> = MainQueue::new();
        let handle = queue.handle();
        handle.dispatch(|v| v.push(1));
        handle.dispatch(|v| v.push(2));

        let mut log = Vec::new();
        assert_eq!(queue.run_pending(&mut log), 2);
        assert_eq!(log, vec![1, 2]);
    }

    #[test]
    fn test_tasks_posted_from_other_thread_run_on_owner() {
        let queue: MainQueue<Vec<thread::ThreadId>> = MainQueue::new();
        let handle = queue.handle();
        thread::spawn(move || {
            handle.dispatch(|ids| ids.push(thread::current().id()));
        })
        .join()
        .unwrap();

        let mut ids = Vec::new();
        queue.run_pending(&mut ids);
        assert_eq!(ids, vec![thread::current().id()]);
    }

    #[test]
    fn test_run_pending_on_empty_queue() {
        let queue: MainQueue<u32> = MainQueue::default();
        let mut value = 0;
        assert_eq!(queue.run_pending(&mut value), 0);
        assert_eq!(value, 0);
    }

    #[test]
    fn test_dispatch_after_teardown_is_ignored() {
        let queue: MainQueue<u32> = MainQueue::new();
        let handle = queue.handle();
        drop(queue);
        assert!(!handle.dispatch(|v| *v += 1));
    }
}
