//! C-compatible FFI bindings for the annindex HNSW library.
//!
//! An index is an opaque `AnnIndex` pointer created by `AnnIndex_New` and
//! destroyed by `AnnIndex_Free`. Every fallible call returns an
//! [`AnnIndexErrorCode`]; output buffers are only written on success.
//! Internal errors and panics never cross the boundary.

// Allow C-style naming conventions to match the C API
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

pub mod boundary;
pub mod capacity;
pub mod error;
pub mod filter;
pub mod index;
pub mod logging;
pub mod query;
pub mod state;
pub mod types;

use boundary::{guard, guard_value};
use error::HandleError;
use filter::ForeignFilter;
use index::IndexHandle;
use types::{
    filterFunction, idType, logCallbackFunction, AnnIndex, AnnIndexErrorCode, AnnIndexSpace,
};

use annindex::query::LabelFilter;
use std::ffi::{c_char, CStr};
use std::path::Path;
use std::ptr;

// ============================================================================
// Pointer helpers
// ============================================================================

unsafe fn handle_ref<'a>(index: *const AnnIndex) -> Result<&'a IndexHandle, HandleError> {
    (index as *const IndexHandle)
        .as_ref()
        .ok_or(HandleError::NullPointer("index"))
}

unsafe fn handle_mut<'a>(index: *mut AnnIndex) -> Result<&'a mut IndexHandle, HandleError> {
    (index as *mut IndexHandle)
        .as_mut()
        .ok_or(HandleError::NullPointer("index"))
}

unsafe fn vector_arg<'a>(
    vector: *const f32,
    dim: usize,
    what: &'static str,
) -> Result<&'a [f32], HandleError> {
    if vector.is_null() {
        return Err(HandleError::NullPointer(what));
    }
    Ok(std::slice::from_raw_parts(vector, dim))
}

unsafe fn out_arg<'a, T>(
    out: *mut T,
    len: usize,
    what: &'static str,
) -> Result<&'a mut [T], HandleError> {
    if len == 0 {
        return Ok(&mut []);
    }
    if out.is_null() {
        return Err(HandleError::NullPointer(what));
    }
    Ok(std::slice::from_raw_parts_mut(out, len))
}

unsafe fn path_arg<'a>(path: *const c_char) -> Result<&'a Path, HandleError> {
    if path.is_null() {
        return Err(HandleError::NullPointer("path"));
    }
    CStr::from_ptr(path)
        .to_str()
        .map(Path::new)
        .map_err(|_| HandleError::InvalidArgument("path is not valid UTF-8".to_string()))
}

// ============================================================================
// Handle lifecycle
// ============================================================================

/// Create a new, uninitialized index handle.
///
/// `space` is an [`AnnIndexSpace`] value. Returns null for an unknown space
/// or a zero dimension.
#[no_mangle]
pub extern "C" fn AnnIndex_New(space: i32, dim: usize) -> *mut AnnIndex {
    let Some(space) = AnnIndexSpace::from_i32(space) else {
        tracing::debug!(space, "unknown space");
        return ptr::null_mut();
    };
    if dim == 0 {
        return ptr::null_mut();
    }
    Box::into_raw(Box::new(IndexHandle::new(space, dim))) as *mut AnnIndex
}

/// Destroy a handle, clearing it first if needed. Null is a no-op.
///
/// # Safety
/// - `index` must be null or a pointer returned by `AnnIndex_New` that was
///   not freed yet
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_Free(index: *mut AnnIndex) {
    if !index.is_null() {
        drop(Box::from_raw(index as *mut IndexHandle));
    }
}

/// Allocate the engine. Allowed once per handle.
///
/// # Safety
/// - `index` must be a valid pointer returned by `AnnIndex_New`
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_Init(
    index: *mut AnnIndex,
    max_elements: usize,
    m: usize,
    ef_construction: usize,
    random_seed: u64,
    allow_replace_deleted: bool,
) -> AnnIndexErrorCode {
    guard("init", || {
        handle_mut(index)?.init(max_elements, m, ef_construction, random_seed, allow_replace_deleted)
    })
}

/// Release the engine. Every later call on the handle reports `AlreadyCleared`.
///
/// # Safety
/// - `index` must be a valid pointer returned by `AnnIndex_New`
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_Clear(index: *mut AnnIndex) -> AnnIndexErrorCode {
    guard("clear", || handle_mut(index)?.clear())
}

// ============================================================================
// Mutating operations
// ============================================================================

/// Insert a vector of the handle's dimension.
///
/// With `id == -1` the next automatic id is used. The id actually used is
/// written to `assigned_id` when it is not null.
///
/// # Safety
/// - `index` must be a valid pointer returned by `AnnIndex_New`
/// - `vector` must point to `dim` floats
/// - `assigned_id` must be null or valid for a write
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_AddItem(
    index: *mut AnnIndex,
    vector: *const f32,
    id: idType,
    replace_deleted: bool,
    assigned_id: *mut idType,
) -> AnnIndexErrorCode {
    guard("add_item", || {
        let handle = handle_mut(index)?;
        handle.ensure_initialized()?;
        let vector = vector_arg(vector, handle.dim(), "vector")?;
        let used = handle.add_item(vector, id, replace_deleted)?;
        if !assigned_id.is_null() {
            *assigned_id = used;
        }
        Ok(())
    })
}

/// Tombstone an id. Its slot and vector are kept.
///
/// # Safety
/// - `index` must be a valid pointer returned by `AnnIndex_New`
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_MarkDeleted(index: *mut AnnIndex, id: idType) -> AnnIndexErrorCode {
    guard("mark_deleted", || handle_mut(index)?.mark_deleted(id))
}

/// Clear the tombstone of an id.
///
/// # Safety
/// - `index` must be a valid pointer returned by `AnnIndex_New`
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_UnmarkDeleted(
    index: *mut AnnIndex,
    id: idType,
) -> AnnIndexErrorCode {
    guard("unmark_deleted", || handle_mut(index)?.unmark_deleted(id))
}

/// Set the capacity. Shrinking below the current count fails.
///
/// # Safety
/// - `index` must be a valid pointer returned by `AnnIndex_New`
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_Resize(
    index: *mut AnnIndex,
    new_capacity: usize,
) -> AnnIndexErrorCode {
    guard("resize", || handle_mut(index)?.resize(new_capacity))
}

/// Set the search-time candidate list size.
///
/// # Safety
/// - `index` must be a valid pointer returned by `AnnIndex_New`
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_SetEf(index: *mut AnnIndex, ef: usize) -> AnnIndexErrorCode {
    guard("set_ef", || handle_mut(index)?.set_ef(ef))
}

/// Write a snapshot of the index to `path`.
///
/// # Safety
/// - `index` must be a valid pointer returned by `AnnIndex_New`
/// - `path` must be a NUL-terminated string
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_SaveIndex(
    index: *mut AnnIndex,
    path: *const c_char,
) -> AnnIndexErrorCode {
    guard("save_index", || {
        let handle = handle_ref(index)?;
        handle.ensure_initialized()?;
        handle.save(path_arg(path)?)
    })
}

/// Load a snapshot from `path`, replacing the current engine if there is one.
///
/// The loaded index has room for at least `max_elements` elements.
///
/// # Safety
/// - `index` must be a valid pointer returned by `AnnIndex_New`
/// - `path` must be a NUL-terminated string
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_LoadIndex(
    index: *mut AnnIndex,
    path: *const c_char,
    max_elements: usize,
) -> AnnIndexErrorCode {
    guard("load_index", || {
        let handle = handle_mut(index)?;
        handle.ensure_live()?;
        handle.load(path_arg(path)?, max_elements)
    })
}

// ============================================================================
// Read-only operations
// ============================================================================

/// Succeeds if `id` is stored and not tombstoned.
///
/// # Safety
/// - `index` must be a valid pointer returned by `AnnIndex_New`
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_HasId(index: *const AnnIndex, id: idType) -> AnnIndexErrorCode {
    guard("has_id", || handle_ref(index)?.has_id(id))
}

/// Copy the vector stored under `id` into `out`.
///
/// `dim` must equal the index dimension.
///
/// # Safety
/// - `index` must be a valid pointer returned by `AnnIndex_New`
/// - `out` must be valid for `dim` float writes
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_GetDataById(
    index: *const AnnIndex,
    id: idType,
    out: *mut f32,
    dim: usize,
) -> AnnIndexErrorCode {
    guard("get_data_by_id", || {
        let handle = handle_ref(index)?;
        handle.ensure_initialized()?;
        if out.is_null() {
            return Err(HandleError::DataRetrievalFailed("null output buffer".to_string()));
        }
        handle.get_data(id, std::slice::from_raw_parts_mut(out, dim))
    })
}

/// Distance between two vectors under the index's space.
///
/// Returns NaN on any failure, including an uninitialized handle.
///
/// # Safety
/// - `index` must be a valid pointer returned by `AnnIndex_New`
/// - `v1` and `v2` must each point to `dim` floats
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_ComputeSimilarity(
    index: *const AnnIndex,
    v1: *const f32,
    v2: *const f32,
) -> f32 {
    guard_value("compute_similarity", f32::NAN, || {
        let handle = handle_ref(index)?;
        handle.ensure_initialized()?;
        let a = vector_arg(v1, handle.dim(), "v1")?;
        let b = vector_arg(v2, handle.dim(), "v2")?;
        handle.compute_similarity(a, b)
    })
}

/// Find the `k` nearest ids to `query`, nearest first.
///
/// `filter` may be null. Fails with `QueryCannotReturn` and writes nothing
/// when fewer than `k` ids qualify.
///
/// # Safety
/// - `index` must be a valid pointer returned by `AnnIndex_New`
/// - `query` must point to `dim` floats
/// - `ids` and `distances` must each be valid for `k` writes
/// - `filter` must be callable with any id in the index
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_KnnQuery(
    index: *const AnnIndex,
    query: *const f32,
    k: usize,
    filter: filterFunction,
    ids: *mut idType,
    distances: *mut f32,
) -> AnnIndexErrorCode {
    guard("knn_query", || {
        let handle = handle_ref(index)?;
        handle.ensure_initialized()?;
        let query = vector_arg(query, handle.dim(), "query")?;
        let ids = out_arg(ids, k, "ids")?;
        let distances = out_arg(distances, k, "distances")?;
        let filter = filter.map(|f| ForeignFilter::new(f));
        handle.knn_query(
            query,
            filter.as_ref().map(|f| f as &dyn LabelFilter),
            ids,
            distances,
        )
    })
}

// ============================================================================
// Accessors
// ============================================================================

/// Number of occupied slots, tombstones included. 0 unless initialized.
///
/// # Safety
/// - `index` must be a valid pointer returned by `AnnIndex_New`
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_GetCurrentCount(index: *const AnnIndex) -> usize {
    guard_value("get_current_count", 0, || {
        handle_ref(index)?.with_engine(|e| e.current_count())
    })
}

/// Current capacity. 0 unless initialized.
///
/// # Safety
/// - `index` must be a valid pointer returned by `AnnIndex_New`
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_GetMaxElements(index: *const AnnIndex) -> usize {
    guard_value("get_max_elements", 0, || {
        handle_ref(index)?.with_engine(|e| e.max_elements())
    })
}

/// # Safety
/// - `index` must be a valid pointer returned by `AnnIndex_New`
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_GetM(index: *const AnnIndex) -> usize {
    guard_value("get_m", 0, || handle_ref(index)?.with_engine(|e| e.m()))
}

/// # Safety
/// - `index` must be a valid pointer returned by `AnnIndex_New`
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_GetEfConstruction(index: *const AnnIndex) -> usize {
    guard_value("get_ef_construction", 0, || {
        handle_ref(index)?.with_engine(|e| e.ef_construction())
    })
}

/// # Safety
/// - `index` must be a valid pointer returned by `AnnIndex_New`
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_GetEf(index: *const AnnIndex) -> usize {
    guard_value("get_ef", 0, || handle_ref(index)?.with_engine(|e| e.ef_runtime()))
}

/// Number of tombstoned elements. 0 unless initialized.
///
/// # Safety
/// - `index` must be a valid pointer returned by `AnnIndex_New`
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_GetDeletedCount(index: *const AnnIndex) -> usize {
    guard_value("get_deleted_count", 0, || {
        handle_ref(index)?.with_engine(|e| e.deleted_count())
    })
}

/// Dimension given at creation; valid in every state. 0 for null.
///
/// # Safety
/// - `index` must be null or a valid pointer returned by `AnnIndex_New`
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_GetDim(index: *const AnnIndex) -> usize {
    guard_value("get_dim", 0, || Ok(handle_ref(index)?.dim()))
}

/// Space given at creation; valid in every state. -1 for null.
///
/// # Safety
/// - `index` must be null or a valid pointer returned by `AnnIndex_New`
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_GetSpace(index: *const AnnIndex) -> i32 {
    guard_value("get_space", -1, || Ok(handle_ref(index)?.space() as i32))
}

/// Lifecycle state as an [`types::AnnIndexState`] value. -1 for null.
///
/// # Safety
/// - `index` must be null or a valid pointer returned by `AnnIndex_New`
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_GetState(index: *const AnnIndex) -> i32 {
    guard_value("get_state", -1, || Ok(handle_ref(index)?.state() as i32))
}

// ============================================================================
// Logging
// ============================================================================

/// Set the log callback function. Null removes it.
///
/// # Safety
/// The callback function must be thread-safe.
#[no_mangle]
pub unsafe extern "C" fn AnnIndex_SetLogCallback(callback: logCallbackFunction) {
    logging::set_log_callback(callback);
}
