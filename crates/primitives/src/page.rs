use serde::{Deserialize, Serialize};

/// A zero-based page index and a page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
	pub page: u32,
	pub size: u32,
}

impl PageRequest {
	pub fn new(page: u32, size: u32) -> Self {
		Self { page, size }
	}

	/// Number of items preceding this page.
	#[inline]
	pub fn offset(&self) -> u64 {
		u64::from(self.page) * u64::from(self.size)
	}
}

/// One page of an ordered listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
	pub items: Vec<T>,
	pub page: u32,
	pub size: u32,
	/// Number of items in the whole listing, independent of this page.
	pub total: u64,
	pub total_pages: u64,
	/// Whether no page follows this one.
	pub last: bool,
}

impl<T> Page<T> {
	/// Wraps a slice fetched for `request` out of `total` items.
	///
	/// `request.size` must be non-zero.
	pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
		let size = u64::from(request.size.max(1));
		let total_pages = total.div_ceil(size);
		Self {
			items,
			page: request.page,
			size: request.size,
			total,
			total_pages,
			last: u64::from(request.page) + 1 >= total_pages,
		}
	}
}
