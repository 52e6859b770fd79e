//! In-memory fetchers for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use super::{FetchMethod, FetchRequest, FetchResponse, RangeFetch, ResponseHeaders};
use crate::error::{ByteSourceError, Result};

/// Plays back queued responses in order and records every request.
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    responses: RefCell<VecDeque<Result<FetchResponse>>>,
    pub requests: RefCell<Vec<FetchRequest>>,
}

impl ScriptedFetcher {
    pub fn new(responses: Vec<Result<FetchResponse>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl RangeFetch for ScriptedFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(ByteSourceError::Read(599)))
    }
}

pub(crate) fn response(status: u32, headers: ResponseHeaders, body: &[u8]) -> FetchResponse {
    FetchResponse {
        status,
        headers,
        body: body.to_vec(),
    }
}

/// Serves a byte buffer the way a range-capable (or range-ignoring) origin would.
pub(crate) struct MemoryOrigin {
    pub data: Vec<u8>,
    pub honor_ranges: bool,
    pub requests: RefCell<Vec<FetchRequest>>,
}

impl MemoryOrigin {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            honor_ranges: true,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn ignoring_ranges(data: Vec<u8>) -> Self {
        Self {
            honor_ranges: false,
            ..Self::new(data)
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn range_headers(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .filter_map(|r| r.range.map(|w| w.range_header_value()))
            .collect()
    }
}

impl RangeFetch for MemoryOrigin {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        self.requests.borrow_mut().push(request.clone());
        let total = self.data.len() as u64;
        let limit = request.body_limit.unwrap_or(u64::MAX);
        if request.method == FetchMethod::Head {
            return Ok(response(
                200,
                ResponseHeaders {
                    content_length: Some(total),
                    accept_ranges: self.honor_ranges,
                    ..Default::default()
                },
                b"",
            ));
        }
        match request.range.filter(|_| self.honor_ranges) {
            Some(w) if w.start >= total => Ok(response(
                416,
                ResponseHeaders {
                    content_range_total: Some(total),
                    ..Default::default()
                },
                b"",
            )),
            Some(w) => {
                let w = w.clip(total);
                let slice = &self.data[w.start as usize..w.end() as usize];
                Ok(response(
                    206,
                    ResponseHeaders {
                        content_length: Some(w.length),
                        content_range_start: Some(w.start),
                        content_range_total: Some(total),
                        accept_ranges: true,
                        ..Default::default()
                    },
                    slice,
                ))
            }
            None => {
                let body = if request.abort_on_full_body {
                    &self.data[..0]
                } else {
                    &self.data[..limit.min(total) as usize]
                };
                Ok(response(
                    200,
                    ResponseHeaders {
                        content_length: Some(total),
                        ..Default::default()
                    },
                    body,
                ))
            }
        }
    }
}
