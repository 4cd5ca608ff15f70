//! OpenCL-offloaded scan (cargo feature `opencl`).
//!
//! The kernel program is compiled once at construction and the packed
//! address matrix is uploaded to the device once. Each call writes the
//! query words, sets the radius argument, enqueues one work-item per hard
//! location, and synchronously reads back a per-location hit mask — there
//! is no asynchronous completion path, matching the blocking contract of
//! the other backends.

use ocl::{Buffer, Context, Device, Kernel, Platform, Program, Queue};

use crate::space::{AddressSpace, BitVector};
use crate::{Error, Result};

/// Reference scan kernel.
///
/// Callers may pass their own source to the constructor as long as it
/// exports a kernel named `scan` with this signature: the packed `ulong`
/// address matrix, the packed query, the word count per address, the
/// radius, and a per-location `uchar` hit output.
pub const KERNEL_SRC: &str = r#"
__kernel void scan(
    __global const ulong* addresses,
    __global const ulong* query,
    const uint words,
    const uint radius,
    __global uchar* hits)
{
    const size_t loc = get_global_id(0);
    __global const ulong* row = addresses + loc * words;
    uint dist = 0;
    for (uint w = 0; w < words; w++) {
        dist += popcount(row[w] ^ query[w]);
    }
    hits[loc] = (dist <= radius) ? 1 : 0;
}
"#;

/// Accelerator-offloaded scan.
///
/// Construction fails with `BackendUnavailable` when no OpenCL platform or
/// device is present or the program does not compile; per-call device
/// failures surface as `Accelerator` errors. A long-running device kernel
/// cannot be interrupted mid-flight.
pub struct OpenClScanner {
    kernel: Kernel,
    query_buf: Buffer<u64>,
    hits_buf: Buffer<u8>,
    sample: usize,
    words: usize,
}

impl OpenClScanner {
    /// Compile `kernel_src` and upload the address matrix of `space`.
    pub fn new(space: &AddressSpace, kernel_src: &str) -> Result<Self> {
        let platform = Platform::list().into_iter().next().ok_or_else(|| {
            Error::BackendUnavailable("no OpenCL platform present".into())
        })?;
        let device = Device::list_all(platform)
            .map_err(unavailable)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::BackendUnavailable("no OpenCL device present".into()))?;

        let context = Context::builder()
            .platform(platform)
            .devices(device)
            .build()
            .map_err(unavailable)?;
        let queue = Queue::new(&context, device, None).map_err(unavailable)?;
        let program = Program::builder()
            .devices(device)
            .src(kernel_src)
            .build(&context)
            .map_err(unavailable)?;

        let sample = space.len();
        let words = BitVector::words_for(space.bits());
        let flat = space.flat_words();

        let addr_buf = Buffer::<u64>::builder()
            .queue(queue.clone())
            .len(flat.len())
            .copy_host_slice(&flat)
            .build()
            .map_err(unavailable)?;
        let query_buf = Buffer::<u64>::builder()
            .queue(queue.clone())
            .len(words)
            .build()
            .map_err(unavailable)?;
        let hits_buf = Buffer::<u8>::builder()
            .queue(queue.clone())
            .len(sample)
            .build()
            .map_err(unavailable)?;

        let kernel = Kernel::builder()
            .program(&program)
            .name("scan")
            .queue(queue)
            .global_work_size(sample)
            .arg(&addr_buf)
            .arg(&query_buf)
            .arg(words as u32)
            .arg_named("radius", 0u32)
            .arg(&hits_buf)
            .build()
            .map_err(unavailable)?;

        tracing::debug!(sample, words, "OpenCL scan kernel compiled");

        Ok(Self {
            kernel,
            query_buf,
            hits_buf,
            sample,
            words,
        })
    }

    /// Indices of locations within `radius` of `query`, ascending.
    /// Blocks until the device pass and the readback complete.
    pub fn activate(&self, query: &BitVector, radius: usize) -> Result<Vec<u32>> {
        debug_assert_eq!(query.words().len(), self.words);

        self.query_buf.write(query.words()).enq().map_err(device)?;
        self.kernel.set_arg("radius", radius as u32).map_err(device)?;
        // Safety: buffer lengths were sized against this address space at
        // construction and the kernel signature is fixed above.
        unsafe {
            self.kernel.enq().map_err(device)?;
        }

        let mut hits = vec![0u8; self.sample];
        self.hits_buf.read(&mut hits).enq().map_err(device)?;

        Ok(hits
            .iter()
            .enumerate()
            .filter(|(_, &h)| h != 0)
            .map(|(i, _)| i as u32)
            .collect())
    }
}

fn unavailable(e: ocl::Error) -> Error {
    Error::BackendUnavailable(e.to_string())
}

fn device(e: ocl::Error) -> Error {
    Error::Accelerator(e.to_string())
}
