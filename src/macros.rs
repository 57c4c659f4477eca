/// Acquires a `Mutex`, treating poisoning as a bug.
///
/// ```rust, ignore
///  let module = lock!(handle.module);
/// ```
macro_rules! lock {
    ($lock:expr) => {
        $lock.lock().expect("Failed to acquire lock")
    };
}

/// Acquires an `RwLock` for reading, treating poisoning as a bug.
///
/// ```rust, ignore
///  let lazy = read_lock!(self.lazy);
/// ```
macro_rules! read_lock {
    ($rwlock:expr) => {
        $rwlock.read().expect("Failed to acquire read lock")
    };
}

/// Acquires an `RwLock` for writing, treating poisoning as a bug.
///
/// ```rust, ignore
///  write_lock!(self.lazy).take();
/// ```
macro_rules! write_lock {
    ($rwlock:expr) => {
        $rwlock.write().expect("Failed to acquire write lock")
    };
}
