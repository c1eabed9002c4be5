//! NIfTI series I/O
//!
//! Decoding is delegated to the `nifti` crate; this module only turns the
//! decoded image into an `f64` array with its geometry, and writes simple
//! float32 NIfTI-1 files for fixtures and exports.

use std::io::{Cursor, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use ndarray::{ArrayBase, ArrayD, ArrayViewD, Axis, Data, Dimension};
use nifti::volume::ndarray::IntoNdArray;
use nifti::{InMemNiftiObject, NiftiHeader, NiftiObject};

use crate::error::{Error, Result};

const HEADER_SIZE: usize = 348;
/// Header plus the 4-byte empty extension block
const DATA_OFFSET: usize = 352;

/// A decoded NIfTI series
#[derive(Debug, Clone)]
pub struct NiftiSeries {
    /// Voxel data in NIfTI index order (x, y, z[, t]), scaling applied
    pub data: ArrayD<f64>,
    /// Dimensions (nx, ny, nz, nt); nt is the extent of the last axis, so
    /// a 3D image counts its z slices as volumes
    pub dims: (usize, usize, usize, usize),
    /// Voxel sizes in mm
    pub voxel_size: (f64, f64, f64),
    /// Repetition time (pixdim[4]), 0 when unset
    pub repetition_time: f64,
    /// Affine transformation matrix (4x4, row-major)
    pub affine: [f64; 16],
}

impl NiftiSeries {
    /// Number of volumes along the last axis.
    pub fn n_volumes(&self) -> usize {
        self.data.shape().last().copied().unwrap_or(0)
    }

    /// View of volume `t`, or `None` when out of range.
    pub fn volume(&self, t: usize) -> Option<ArrayViewD<'_, f64>> {
        let axis = Axis(self.data.ndim().checked_sub(1)?);
        if t >= self.data.len_of(axis) {
            return None;
        }
        Some(self.data.index_axis(axis, t))
    }
}

/// Check if bytes are gzip compressed
fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

/// Short header summary used in decode errors
fn header_info(bytes: &[u8]) -> String {
    if bytes.len() < HEADER_SIZE {
        return format!(
            "file too small ({} bytes, need at least {})",
            bytes.len(),
            HEADER_SIZE
        );
    }

    let sizeof_hdr = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let magic = String::from_utf8_lossy(&bytes[344..348]).to_string();
    let datatype = i16::from_le_bytes([bytes[70], bytes[71]]);

    format!(
        "sizeof_hdr={}, magic='{}', datatype={}",
        sizeof_hdr,
        magic.trim_end_matches('\0'),
        datatype
    )
}

fn decode(bytes: &[u8]) -> Result<InMemNiftiObject> {
    if is_gzip(bytes) {
        InMemNiftiObject::from_reader(GzDecoder::new(Cursor::new(bytes))).map_err(|e| {
            let mut decompressed = Vec::new();
            let info = match std::io::Read::read_to_end(
                &mut GzDecoder::new(Cursor::new(bytes)),
                &mut decompressed,
            ) {
                Ok(_) => header_info(&decompressed),
                Err(_) => "could not decompress".to_string(),
            };
            Error::Decode(format!("gzipped NIfTI: {} ({})", e, info))
        })
    } else {
        InMemNiftiObject::from_reader(Cursor::new(bytes))
            .map_err(|e| Error::Decode(format!("{} ({})", e, header_info(bytes))))
    }
}

/// Load a NIfTI series from bytes
///
/// Supports both .nii and .nii.gz (gzip is auto-detected). 3D images are
/// returned as they are; their last axis is z. Images with more than four
/// dimensions are rejected.
pub fn load_nifti_series(bytes: &[u8]) -> Result<NiftiSeries> {
    let obj = decode(bytes)?;
    let header = obj.header();

    let pixdim = header.pixdim;
    let voxel_size = (pixdim[1] as f64, pixdim[2] as f64, pixdim[3] as f64);
    let repetition_time = pixdim[4] as f64;
    let affine = get_affine(header);

    let data: ArrayD<f64> = obj
        .into_volume()
        .into_ndarray()
        .map_err(|e| Error::Decode(format!("conversion to ndarray failed: {}", e)))?;

    // Geometry follows the decoded array shape, not header.dim
    let shape = data.shape();
    if shape.len() != 3 && shape.len() != 4 {
        return Err(Error::InvalidShape(format!(
            "expected a 3D or 4D image, got {}D",
            shape.len()
        )));
    }
    let dims = (shape[0], shape[1], shape[2], shape[shape.len() - 1]);

    tracing::debug!(?dims, ?voxel_size, repetition_time, "loaded NIfTI series");

    Ok(NiftiSeries {
        data,
        dims,
        voxel_size,
        repetition_time,
        affine,
    })
}

/// Read a NIfTI series from a filesystem path
pub fn read_nifti_series_file(path: &Path) -> Result<NiftiSeries> {
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    load_nifti_series(&bytes)
}

/// Get affine transformation matrix from header
fn get_affine(header: &NiftiHeader) -> [f64; 16] {
    // Prefer sform if available
    if header.sform_code > 0 {
        let s = &header.srow_x;
        let t = &header.srow_y;
        let u = &header.srow_z;
        [
            s[0] as f64, s[1] as f64, s[2] as f64, s[3] as f64,
            t[0] as f64, t[1] as f64, t[2] as f64, t[3] as f64,
            u[0] as f64, u[1] as f64, u[2] as f64, u[3] as f64,
            0.0, 0.0, 0.0, 1.0,
        ]
    } else {
        let vsx = header.pixdim[1] as f64;
        let vsy = header.pixdim[2] as f64;
        let vsz = header.pixdim[3] as f64;
        [
            vsx, 0.0, 0.0, 0.0,
            0.0, vsy, 0.0, 0.0,
            0.0, 0.0, vsz, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]
    }
}

fn put_i16(header: &mut [u8], offset: usize, value: i16) {
    header[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_f32(header: &mut [u8], offset: usize, value: f32) {
    header[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Encode a 3D or 4D array as an uncompressed single-file NIfTI-1 image
///
/// Data is stored as float32 with x varying fastest. `repetition_time` goes
/// to pixdim[4].
pub fn save_nifti_series<S, D>(
    data: &ArrayBase<S, D>,
    voxel_size: (f64, f64, f64),
    repetition_time: f64,
    affine: &[f64; 16],
) -> Result<Vec<u8>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let shape = data.shape();
    if shape.len() != 3 && shape.len() != 4 {
        return Err(Error::InvalidShape(format!(
            "can only write 3D or 4D images, got {}D",
            shape.len()
        )));
    }

    let mut dim = [1i16; 8];
    dim[0] = shape.len() as i16;
    for (i, &extent) in shape.iter().enumerate() {
        dim[i + 1] = i16::try_from(extent).map_err(|_| {
            Error::Write(format!("dimension {} too large for NIfTI-1: {}", i + 1, extent))
        })?;
    }

    let (vsx, vsy, vsz) = voxel_size;
    let mut header = [0u8; HEADER_SIZE];

    header[0..4].copy_from_slice(&(HEADER_SIZE as i32).to_le_bytes());
    for (i, &d) in dim.iter().enumerate() {
        put_i16(&mut header, 40 + i * 2, d);
    }

    // datatype FLOAT32, bitpix 32
    put_i16(&mut header, 70, 16);
    put_i16(&mut header, 72, 32);

    let pixdim: [f32; 8] = [
        1.0,
        vsx as f32,
        vsy as f32,
        vsz as f32,
        repetition_time as f32,
        1.0,
        1.0,
        1.0,
    ];
    for (i, &p) in pixdim.iter().enumerate() {
        put_f32(&mut header, 76 + i * 4, p);
    }

    put_f32(&mut header, 108, DATA_OFFSET as f32);
    put_f32(&mut header, 112, 1.0);
    put_f32(&mut header, 116, 0.0);

    // sform_code = 1 (scanner anat)
    put_i16(&mut header, 254, 1);
    for row in 0..3 {
        for col in 0..4 {
            put_f32(&mut header, 280 + row * 16 + col * 4, affine[row * 4 + col] as f32);
        }
    }

    header[344..348].copy_from_slice(b"n+1\0");

    let mut buffer = Vec::with_capacity(DATA_OFFSET + data.len() * 4);
    buffer
        .write_all(&header)
        .map_err(|e| Error::Write(format!("header: {}", e)))?;
    buffer
        .write_all(&[0u8; 4])
        .map_err(|e| Error::Write(format!("extension: {}", e)))?;

    // Fortran order: reversing the axes makes logical order x-fastest
    for &val in data.t().iter() {
        buffer
            .write_all(&(val as f32).to_le_bytes())
            .map_err(|e| Error::Write(format!("data: {}", e)))?;
    }

    Ok(buffer)
}

/// Encode a 3D or 4D array as gzipped NIfTI bytes (.nii.gz)
pub fn save_nifti_series_gz<S, D>(
    data: &ArrayBase<S, D>,
    voxel_size: (f64, f64, f64),
    repetition_time: f64,
    affine: &[f64; 16],
) -> Result<Vec<u8>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let uncompressed = save_nifti_series(data, voxel_size, repetition_time, affine)?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&uncompressed)
        .map_err(|e| Error::Write(format!("gzip compression: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| Error::Write(format!("gzip finish: {}", e)))
}

/// Save a series to a file
///
/// Paths ending in .nii.gz are gzip compressed, anything else is written as
/// uncompressed .nii.
pub fn save_nifti_series_to_file<S, D>(
    path: &Path,
    data: &ArrayBase<S, D>,
    voxel_size: (f64, f64, f64),
    repetition_time: f64,
    affine: &[f64; 16],
) -> Result<()>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let bytes = if path.to_string_lossy().ends_with(".nii.gz") {
        save_nifti_series_gz(data, voxel_size, repetition_time, affine)?
    } else {
        save_nifti_series(data, voxel_size, repetition_time, affine)?
    };

    std::fs::write(path, &bytes).map_err(|e| Error::io(path, e))
}
