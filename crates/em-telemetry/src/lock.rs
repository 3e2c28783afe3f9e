//! Advisory per-table write lock.
//!
//! Writers from any thread or process take an exclusive `flock` on the
//! table's `.lock` file while allocating a sequence number and publishing
//! a segment. Readers never lock: segments appear by atomic rename.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

/// How long a writer waits for a contended table lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Held exclusive lock on a table directory. Released on drop.
pub struct TableLock {
    file: File,
}

impl TableLock {
    /// Take the exclusive lock on `path`, waiting at most `timeout`.
    ///
    /// A lock still held by someone else at the deadline fails with
    /// `ErrorKind::WouldBlock`.
    pub fn acquire(path: &Path, timeout: Duration) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            let fd = file.as_raw_fd();
            let deadline = Instant::now() + timeout;
            loop {
                let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
                if result == 0 {
                    break;
                }
                let err = io::Error::last_os_error();
                match err.kind() {
                    io::ErrorKind::Interrupted => continue,
                    io::ErrorKind::WouldBlock if Instant::now() < deadline => {
                        std::thread::sleep(POLL_INTERVAL);
                    }
                    io::ErrorKind::WouldBlock => {
                        return Err(io::Error::new(
                            io::ErrorKind::WouldBlock,
                            format!("table lock {} held by another writer", path.display()),
                        ));
                    }
                    _ => return Err(err),
                }
            }
        }
        #[cfg(not(unix))]
        let _ = timeout;

        Ok(TableLock { file })
    }
}

impl Drop for TableLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            unsafe {
                libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
            }
        }
        // The lock file stays: removing it would let a waiter lock a
        // deleted inode while a newcomer locks a fresh one.
    }
}
