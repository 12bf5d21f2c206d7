//! Measured reflectance data: MERL isotropic tables and tabulated Fourier
//! BSDFs. Both evaluate the stored data and importance-sample with the
//! shared cosine-hemisphere sampler.

// std
use std::fs::File;
use std::io;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
// others
use byteorder::{LittleEndian, ReadBytesExt};
// spica
use crate::core::base::{clamp_t, Float, Spectrum};
use crate::core::geometry::{vec3_cross_vec3, vec3_dot_vec3f, Vector3f};
use crate::core::reflection::{cos_d_phi, cos_theta, vec3_same_hemisphere_vec3, BxdfType};

fn bad_data(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

const MERL_RES_THETA_H: usize = 90;
const MERL_RES_THETA_D: usize = 90;
const MERL_RES_PHI_D: usize = 180;
const MERL_SCALE: [f64; 3] = [1.0 / 1500.0, 1.15 / 1500.0, 1.66 / 1500.0];

/// A MERL 100 isotropic BRDF table.
#[derive(Debug)]
pub struct MerlTable {
    data: Vec<f64>,
}

impl MerlTable {
    pub fn read(path: &Path) -> io::Result<Self> {
        let mut file = BufReader::new(File::open(path)?);
        let dim_h = file.read_i32::<LittleEndian>()? as usize;
        let dim_d = file.read_i32::<LittleEndian>()? as usize;
        let dim_p = file.read_i32::<LittleEndian>()? as usize;
        if dim_h != MERL_RES_THETA_H || dim_d != MERL_RES_THETA_D || dim_p != MERL_RES_PHI_D {
            return Err(bad_data("unexpected MERL table dimensions"));
        }
        let n = 3 * dim_h * dim_d * dim_p;
        let mut data: Vec<f64> = Vec::with_capacity(n);
        let mut buf = [0_u8; 8];
        for _ in 0..n {
            file.read_exact(&mut buf)?;
            data.push(f64::from_le_bytes(buf));
        }
        Ok(MerlTable { data })
    }
    fn index(theta_h: Float, theta_d: Float, phi_d: Float) -> usize {
        // the theta_h axis is warped toward grazing angles
        let h = ((theta_h / (std::f32::consts::FRAC_PI_2)).max(0.0).sqrt()
            * MERL_RES_THETA_H as Float) as usize;
        let h = h.min(MERL_RES_THETA_H - 1);
        let d = ((theta_d / std::f32::consts::FRAC_PI_2) * MERL_RES_THETA_D as Float) as usize;
        let d = d.min(MERL_RES_THETA_D - 1);
        let mut phi_d = phi_d;
        if phi_d < 0.0 {
            phi_d += std::f32::consts::PI;
        }
        let p = ((phi_d / std::f32::consts::PI) * MERL_RES_PHI_D as Float) as usize;
        let p = p.min(MERL_RES_PHI_D - 1);
        (h * MERL_RES_THETA_D + d) * MERL_RES_PHI_D + p
    }
    pub fn lookup(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        // half-angle parameterization
        let wh: Vector3f = (*wo + *wi).normalize();
        let theta_h: Float = clamp_t(wh.z, -1.0, 1.0).acos();
        let theta_d: Float = clamp_t(vec3_dot_vec3f(wi, &wh), -1.0, 1.0).acos();
        // phi_d: azimuth of wi around wh
        let bi_normal = Vector3f {
            x: 0.0,
            y: 1.0,
            z: 0.0,
        };
        let tangent = vec3_cross_vec3(&bi_normal, &wh);
        let tangent = if tangent.length_squared() > 1e-9 {
            tangent.normalize()
        } else {
            Vector3f {
                x: 1.0,
                y: 0.0,
                z: 0.0,
            }
        };
        let bitangent = vec3_cross_vec3(&wh, &tangent);
        let x = vec3_dot_vec3f(wi, &tangent);
        let y = vec3_dot_vec3f(wi, &bitangent);
        let phi_d: Float = y.atan2(x);
        let base = MerlTable::index(theta_h, theta_d, phi_d);
        let stride = MERL_RES_THETA_H * MERL_RES_THETA_D * MERL_RES_PHI_D;
        let r = (self.data[base] * MERL_SCALE[0]).max(0.0) as Float;
        let g = (self.data[base + stride] * MERL_SCALE[1]).max(0.0) as Float;
        let b = (self.data[base + 2 * stride] * MERL_SCALE[2]).max(0.0) as Float;
        Spectrum::rgb(r, g, b)
    }
}

#[derive(Debug, Clone)]
pub struct MerlBrdf {
    pub table: Arc<MerlTable>,
}

impl MerlBrdf {
    pub fn new(table: Arc<MerlTable>) -> Self {
        MerlBrdf { table }
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        if !vec3_same_hemisphere_vec3(wo, wi) {
            return Spectrum::default();
        }
        self.table.lookup(wo, wi)
    }
    pub fn get_type(&self) -> u8 {
        BxdfType::BsdfReflection as u8 | BxdfType::BsdfGlossy as u8
    }
}

/// Tabulated Fourier BSDF (the `SCATFUN` v1 format). Only monochromatic
/// and RGB tables with uniform material properties are supported.
#[derive(Debug, Default)]
pub struct FourierTable {
    pub eta: Float,
    pub m_max: i32,
    pub n_channels: i32,
    pub n_mu: i32,
    pub mu: Vec<Float>,
    pub m: Vec<i32>,
    pub a_offset: Vec<i32>,
    pub a: Vec<Float>,
}

impl FourierTable {
    pub fn read(path: &Path) -> io::Result<Self> {
        let mut file = BufReader::new(File::open(path)?);
        let mut header = [0_u8; 8];
        file.read_exact(&mut header)?;
        let header_exp: [u8; 8] = [b'S', b'C', b'A', b'T', b'F', b'U', b'N', 0x01_u8];
        if header != header_exp {
            return Err(bad_data("not a SCATFUN v1 table"));
        }
        let mut ints: [i32; 9] = [0; 9];
        file.read_i32_into::<LittleEndian>(&mut ints)?;
        let flags: i32 = ints[0];
        let n_mu: i32 = ints[1];
        let n_coeffs: i32 = ints[2];
        let m_max: i32 = ints[3];
        let n_channels: i32 = ints[4];
        let n_bases: i32 = ints[5];
        let eta: Float = file.read_f32::<LittleEndian>()?;
        let mut unused: [i32; 4] = [0; 4];
        file.read_i32_into::<LittleEndian>(&mut unused)?;
        if flags != 1_i32 || (n_channels != 1_i32 && n_channels != 3_i32) || n_bases != 1_i32 {
            return Err(bad_data("incompatible SCATFUN layout"));
        }
        let mut table = FourierTable {
            eta,
            m_max,
            n_channels,
            n_mu,
            ..Default::default()
        };
        table.mu.reserve_exact(n_mu as usize);
        for _ in 0..n_mu as usize {
            table.mu.push(file.read_f32::<LittleEndian>()?);
        }
        // the sampling CDF is stored but unused here; skip over it
        for _ in 0..(n_mu as usize * n_mu as usize) {
            let _ = file.read_f32::<LittleEndian>()?;
        }
        let mut offset_and_length: Vec<i32> =
            Vec::with_capacity(n_mu as usize * n_mu as usize * 2);
        for _ in 0..(n_mu as usize * n_mu as usize * 2) {
            offset_and_length.push(file.read_i32::<LittleEndian>()?);
        }
        table.a.reserve_exact(n_coeffs as usize);
        for _ in 0..n_coeffs as usize {
            table.a.push(file.read_f32::<LittleEndian>()?);
        }
        table
            .a_offset
            .reserve_exact(n_mu as usize * n_mu as usize);
        table.m.reserve_exact(n_mu as usize * n_mu as usize);
        for i in 0..(n_mu as usize * n_mu as usize) {
            table.a_offset.push(offset_and_length[2 * i]);
            table.m.push(offset_and_length[2 * i + 1]);
        }
        Ok(table)
    }
    pub fn get_ak(&self, offset_i: i32, offset_o: i32, mptr: &mut i32) -> i32 {
        let idx: i32 = offset_o * self.n_mu + offset_i;
        *mptr = self.m[idx as usize];
        self.a_offset[idx as usize]
    }
}

/// Catmull-Rom interpolation weights over the `nodes` grid.
pub fn catmull_rom_weights(
    nodes: &[Float],
    x: Float,
    offset: &mut i32,
    weights: &mut [Float; 4],
) -> bool {
    if nodes.len() < 2 || x < nodes[0] || x > nodes[nodes.len() - 1] {
        return false;
    }
    // binary search for the interval containing x
    let mut first: usize = 0;
    let mut len: usize = nodes.len();
    while len > 0 {
        let half = len >> 1;
        let middle = first + half;
        if nodes[middle] <= x {
            first = middle + 1;
            len -= half + 1;
        } else {
            len = half;
        }
    }
    let i: usize = clamp_t(first as isize - 1, 0, nodes.len() as isize - 2) as usize;
    let x0: Float = nodes[i];
    let x1: Float = nodes[i + 1];
    let t: Float = (x - x0) / (x1 - x0);
    let t2: Float = t * t;
    let t3: Float = t2 * t;
    *offset = i as i32 - 1;
    weights[1] = 2.0 * t3 - 3.0 * t2 + 1.0;
    weights[2] = -2.0 * t3 + 3.0 * t2;
    // endpoint derivatives, one-sided at the boundaries
    if i > 0 {
        let w0: Float = (t3 - 2.0 * t2 + t) * (x1 - x0) / (x1 - nodes[i - 1]);
        weights[0] = -w0;
        weights[2] += w0;
    } else {
        let w0: Float = t3 - 2.0 * t2 + t;
        weights[0] = 0.0;
        weights[1] -= w0;
        weights[2] += w0;
    }
    if i + 2 < nodes.len() {
        let w3: Float = (t3 - t2) * (x1 - x0) / (nodes[i + 2] - x0);
        weights[3] = w3;
        weights[1] -= w3;
    } else {
        let w3: Float = t3 - t2;
        weights[1] -= w3;
        weights[2] += w3;
        weights[3] = 0.0;
    }
    true
}

/// Evaluate the cosine series sum a_k cos(k phi).
pub fn fourier(a: &[Float], start: usize, m: i32, cos_phi: f64) -> Float {
    let mut value: f64 = 0.0;
    let mut cos_k_minus_one_phi: f64 = cos_phi;
    let mut cos_k_phi: f64 = 1.0;
    for k in 0..m as usize {
        value += a[start + k] as f64 * cos_k_phi;
        let cos_k_plus_one_phi: f64 = 2.0 * cos_phi * cos_k_phi - cos_k_minus_one_phi;
        cos_k_minus_one_phi = cos_k_phi;
        cos_k_phi = cos_k_plus_one_phi;
    }
    value as Float
}

#[derive(Debug, Clone)]
pub struct FourierBsdf {
    pub table: Arc<FourierTable>,
}

impl FourierBsdf {
    pub fn new(table: Arc<FourierTable>) -> Self {
        FourierBsdf { table }
    }
    pub fn f(&self, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        // zenith cosines and azimuth difference
        let mu_i: Float = cos_theta(&-(*wi));
        let mu_o: Float = cos_theta(wo);
        let cphi: Float = cos_d_phi(&-(*wi), wo);
        let mut offset_i: i32 = 0;
        let mut offset_o: i32 = 0;
        let mut weights_i: [Float; 4] = [0.0; 4];
        let mut weights_o: [Float; 4] = [0.0; 4];
        if !catmull_rom_weights(&self.table.mu, mu_i, &mut offset_i, &mut weights_i)
            || !catmull_rom_weights(&self.table.mu, mu_o, &mut offset_o, &mut weights_o)
        {
            return Spectrum::default();
        }
        let mut ak: Vec<Float> =
            vec![0.0; (self.table.m_max * self.table.n_channels) as usize];
        let mut m_max: i32 = 0;
        for (b, weight_o) in weights_o.iter().enumerate() {
            for (a, weight_i) in weights_i.iter().enumerate() {
                let weight: Float = weight_i * weight_o;
                if weight == 0.0 as Float {
                    continue;
                }
                let oi = offset_i + a as i32;
                let oo = offset_o + b as i32;
                if oi < 0 || oo < 0 || oi >= self.table.n_mu || oo >= self.table.n_mu {
                    continue;
                }
                let mut m: i32 = 0;
                let a_idx: i32 = self.table.get_ak(oi, oo, &mut m);
                m_max = std::cmp::max(m_max, m);
                for c in 0..self.table.n_channels as usize {
                    for k in 0..m as usize {
                        ak[c * self.table.m_max as usize + k] +=
                            weight * self.table.a[(a_idx + c as i32 * m + k as i32) as usize];
                    }
                }
            }
        }
        let y: Float = (0.0 as Float).max(fourier(&ak, 0, m_max, cphi as f64));
        let scale: Float = if mu_i != 0.0 as Float {
            1.0 as Float / mu_i.abs()
        } else {
            0.0 as Float
        };
        if self.table.n_channels == 1 {
            Spectrum::new(y * scale)
        } else {
            let r: Float = fourier(&ak, self.table.m_max as usize, m_max, cphi as f64);
            let b: Float = fourier(&ak, 2 * self.table.m_max as usize, m_max, cphi as f64);
            let g: Float = 1.398_29 * y - 0.100_913 * b - 0.297_375 * r;
            Spectrum::rgb(r * scale, g * scale, b * scale)
                .clamp(0.0 as Float, std::f32::INFINITY)
        }
    }
    pub fn get_type(&self) -> u8 {
        BxdfType::BsdfReflection as u8
            | BxdfType::BsdfTransmission as u8
            | BxdfType::BsdfGlossy as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catmull_rom_weights_partition_unity() {
        let nodes: Vec<Float> = vec![-1.0, -0.5, 0.0, 0.5, 1.0];
        let mut offset: i32 = 0;
        let mut weights: [Float; 4] = [0.0; 4];
        assert!(catmull_rom_weights(&nodes, 0.3, &mut offset, &mut weights));
        let sum: Float = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4, "weights sum {}", sum);
    }

    #[test]
    fn fourier_series_constant_term() {
        let a: Vec<Float> = vec![0.5, 0.0, 0.0];
        assert!((fourier(&a, 0, 3, 0.25) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn merl_index_stays_in_bounds() {
        for &(th, td, pd) in [
            (0.0, 0.0, 0.0),
            (1.570, 1.570, 3.141),
            (0.78, 0.2, -1.0),
        ]
        .iter()
        {
            let idx = MerlTable::index(th, td, pd);
            assert!(idx < MERL_RES_THETA_H * MERL_RES_THETA_D * MERL_RES_PHI_D);
        }
    }
}
