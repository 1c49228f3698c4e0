use std::collections::HashMap;
use std::ffi::CStr;
use std::sync::{Mutex, PoisonError};

/// Initial getpwuid_r scratch buffer; grown on ERANGE up to `MAX_PWBUF`.
const INITIAL_PWBUF: usize = 1024;
const MAX_PWBUF: usize = 64 * 1024;

/// Maps numeric user ids to login names.
pub trait UserDirectory: Send + Sync {
    fn name_of(&self, uid: u32) -> Option<String>;
}

/// The system user database (`getpwuid_r`).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemUsers;

impl UserDirectory for SystemUsers {
    #[allow(unsafe_code)]
    fn name_of(&self, uid: u32) -> Option<String> {
        let mut buf: Vec<libc::c_char> = vec![0; INITIAL_PWBUF];
        loop {
            let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
            let mut result: *mut libc::passwd = std::ptr::null_mut();
            let rc = unsafe {
                libc::getpwuid_r(
                    uid as libc::uid_t,
                    &mut pwd,
                    buf.as_mut_ptr(),
                    buf.len(),
                    &mut result,
                )
            };
            if rc == libc::ERANGE && buf.len() < MAX_PWBUF {
                let grown = buf.len() * 2;
                buf.resize(grown, 0);
                continue;
            }
            if rc != 0 || result.is_null() || pwd.pw_name.is_null() {
                return None;
            }
            // pw_name points into `buf`, which outlives this borrow.
            let name = unsafe { CStr::from_ptr(pwd.pw_name) };
            return Some(name.to_string_lossy().into_owned());
        }
    }
}

/// Memoizes lookups of an inner directory, misses included.
///
/// A snapshot resolves the same handful of uids hundreds of times, so every
/// uid hits the user database at most once per collector lifetime.
pub struct CachedUsers<D> {
    inner: D,
    cache: Mutex<HashMap<u32, Option<String>>>,
}

impl<D: UserDirectory> CachedUsers<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

impl<D: UserDirectory> UserDirectory for CachedUsers<D> {
    fn name_of(&self, uid: u32) -> Option<String> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache
            .entry(uid)
            .or_insert_with(|| self.inner.name_of(uid))
            .clone()
    }
}
