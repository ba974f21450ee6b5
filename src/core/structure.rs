//! Periodic structure geometry and text serialization (CIF, POSCAR).

use crate::domain::model::{Lattice, Site, Species, Structure};
use crate::utils::error::{PredictionError, Result};
use std::fmt::{self, Write as _};

const OCCUPANCY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeParameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub volume: f64,
}

fn dot(u: &[f64; 3], v: &[f64; 3]) -> f64 {
    u[0] * v[0] + u[1] * v[1] + u[2] * v[2]
}

fn norm(v: &[f64; 3]) -> f64 {
    dot(v, v).sqrt()
}

fn angle_degrees(u: &[f64; 3], v: &[f64; 3]) -> f64 {
    let cos = (dot(u, v) / (norm(u) * norm(v))).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

impl Lattice {
    pub fn volume(&self) -> f64 {
        let [a, b, c] = &self.matrix;
        let cross = [
            b[1] * c[2] - b[2] * c[1],
            b[2] * c[0] - b[0] * c[2],
            b[0] * c[1] - b[1] * c[0],
        ];
        dot(a, &cross).abs()
    }

    pub fn parameters(&self) -> LatticeParameters {
        let [a, b, c] = &self.matrix;
        LatticeParameters {
            a: norm(a),
            b: norm(b),
            c: norm(c),
            alpha: angle_degrees(b, c),
            beta: angle_degrees(a, c),
            gamma: angle_degrees(a, b),
            volume: self.volume(),
        }
    }

    fn scaled(&self, factors: [usize; 3]) -> Lattice {
        let mut matrix = self.matrix;
        for (row, factor) in matrix.iter_mut().zip(factors) {
            for value in row.iter_mut() {
                *value *= factor as f64;
            }
        }
        Lattice { matrix }
    }
}

impl Site {
    fn is_ordered(&self) -> bool {
        matches!(self.species.as_slice(), [only] if (only.occu - 1.0).abs() < OCCUPANCY_TOLERANCE)
    }
}

impl Structure {
    pub fn validate(&self) -> Result<()> {
        if self.sites.is_empty() {
            return Err(PredictionError::StructureError {
                message: "structure has no sites".to_string(),
            });
        }
        if self.lattice.volume() < OCCUPANCY_TOLERANCE {
            return Err(PredictionError::StructureError {
                message: "lattice vectors are degenerate".to_string(),
            });
        }
        if let Some(index) = self.sites.iter().position(|s| s.species.is_empty()) {
            return Err(PredictionError::StructureError {
                message: format!("site {} has no species", index),
            });
        }
        Ok(())
    }

    /// Repeats the cell `na × nb × nc` times. Sites stay grouped by their
    /// original site, images enumerated with the c index varying fastest.
    pub fn supercell(&self, factors: [usize; 3]) -> Result<Structure> {
        if factors.contains(&0) {
            return Err(PredictionError::StructureError {
                message: format!("invalid supercell factors {:?}", factors),
            });
        }
        let [na, nb, nc] = factors;

        let mut sites = Vec::with_capacity(self.sites.len() * na * nb * nc);
        for site in &self.sites {
            for i in 0..na {
                for j in 0..nb {
                    for k in 0..nc {
                        sites.push(Site {
                            species: site.species.clone(),
                            abc: [
                                (site.abc[0] + i as f64) / na as f64,
                                (site.abc[1] + j as f64) / nb as f64,
                                (site.abc[2] + k as f64) / nc as f64,
                            ],
                            label: site.label.clone(),
                        });
                    }
                }
            }
        }

        Ok(Structure {
            lattice: self.lattice.scaled(factors),
            sites,
        })
    }

    /// Element amounts in order of first appearance.
    pub fn composition(&self) -> Vec<(String, f64)> {
        let mut amounts: Vec<(String, f64)> = Vec::new();
        for species in self.sites.iter().flat_map(|s| s.species.iter()) {
            match amounts.iter_mut().find(|(el, _)| *el == species.element) {
                Some((_, amount)) => *amount += species.occu,
                None => amounts.push((species.element.clone(), species.occu)),
            }
        }
        amounts
    }

    pub fn formula_units(&self) -> u64 {
        let mut z = 0;
        for (_, amount) in self.composition() {
            let rounded = amount.round();
            if (amount - rounded).abs() > OCCUPANCY_TOLERANCE || rounded < 1.0 {
                return 1;
            }
            z = gcd(z, rounded as u64);
        }
        z.max(1)
    }

    pub fn to_cif(&self, formula: &str) -> Result<String> {
        self.validate()?;
        let mut cif = String::new();
        self.write_cif(&mut cif, formula)
            .map_err(|e| PredictionError::StructureError {
                message: format!("failed to write CIF: {}", e),
            })?;
        Ok(cif)
    }

    fn write_cif<W: fmt::Write>(&self, out: &mut W, formula: &str) -> fmt::Result {
        let params = self.lattice.parameters();
        let block = formula
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>();
        let formula_sum = self
            .composition()
            .iter()
            .map(|(el, amount)| format!("{}{}", el, format_amount(*amount)))
            .collect::<Vec<_>>()
            .join(" ");

        writeln!(out, "# generated by materials-predictor")?;
        writeln!(out, "data_{}", block)?;
        writeln!(out, "_symmetry_space_group_name_H-M   'P 1'")?;
        writeln!(out, "_cell_length_a   {:.8}", params.a)?;
        writeln!(out, "_cell_length_b   {:.8}", params.b)?;
        writeln!(out, "_cell_length_c   {:.8}", params.c)?;
        writeln!(out, "_cell_angle_alpha   {:.8}", params.alpha)?;
        writeln!(out, "_cell_angle_beta   {:.8}", params.beta)?;
        writeln!(out, "_cell_angle_gamma   {:.8}", params.gamma)?;
        writeln!(out, "_symmetry_Int_Tables_number   1")?;
        writeln!(out, "_chemical_formula_structural   {}", block)?;
        writeln!(out, "_chemical_formula_sum   '{}'", formula_sum)?;
        writeln!(out, "_cell_volume   {:.8}", params.volume)?;
        writeln!(out, "_cell_formula_units_Z   {}", self.formula_units())?;
        writeln!(out, "loop_")?;
        writeln!(out, " _symmetry_equiv_pos_site_id")?;
        writeln!(out, " _symmetry_equiv_pos_as_xyz")?;
        writeln!(out, "  1  'x, y, z'")?;
        writeln!(out, "loop_")?;
        for column in [
            "_atom_site_type_symbol",
            "_atom_site_label",
            "_atom_site_symmetry_multiplicity",
            "_atom_site_fract_x",
            "_atom_site_fract_y",
            "_atom_site_fract_z",
            "_atom_site_occupancy",
        ] {
            writeln!(out, " {}", column)?;
        }

        // Labels count per element: Zn0, Zn1, ..., O0, ...
        let mut label_counts: Vec<(String, usize)> = Vec::new();
        for site in &self.sites {
            for Species { element, occu } in &site.species {
                let index = match label_counts.iter_mut().find(|(el, _)| el == element) {
                    Some((_, count)) => {
                        *count += 1;
                        *count - 1
                    }
                    None => {
                        label_counts.push((element.clone(), 1));
                        0
                    }
                };
                writeln!(
                    out,
                    "  {}  {}{}  1  {:.8}  {:.8}  {:.8}  {}",
                    element,
                    element,
                    index,
                    site.abc[0],
                    site.abc[1],
                    site.abc[2],
                    format_amount(*occu)
                )?;
            }
        }
        Ok(())
    }

    /// VASP 5 POSCAR; `None` for partially occupied structures, which the
    /// format cannot express.
    pub fn to_poscar(&self, comment: &str) -> Option<String> {
        if self.validate().is_err() || !self.sites.iter().all(Site::is_ordered) {
            return None;
        }

        let mut poscar = String::new();
        self.write_poscar(&mut poscar, comment).ok()?;
        Some(poscar)
    }

    fn write_poscar<W: fmt::Write>(&self, out: &mut W, comment: &str) -> fmt::Result {
        let elements: Vec<String> = self.composition().into_iter().map(|(el, _)| el).collect();

        writeln!(out, "{}", comment.lines().next().unwrap_or(""))?;
        writeln!(out, "1.0")?;
        for row in &self.lattice.matrix {
            writeln!(out, "  {:>14.8}  {:>14.8}  {:>14.8}", row[0], row[1], row[2])?;
        }
        writeln!(out, "{}", elements.join(" "))?;

        let mut grouped: Vec<&Site> = Vec::with_capacity(self.sites.len());
        let mut counts = Vec::with_capacity(elements.len());
        for element in &elements {
            let before = grouped.len();
            grouped.extend(
                self.sites
                    .iter()
                    .filter(|s| s.species[0].element == *element),
            );
            counts.push((grouped.len() - before).to_string());
        }
        writeln!(out, "{}", counts.join(" "))?;
        writeln!(out, "direct")?;
        for site in grouped {
            writeln!(
                out,
                "  {:.8}  {:.8}  {:.8} {}",
                site.abc[0], site.abc[1], site.abc[2], site.species[0].element
            )?;
        }
        Ok(())
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn format_amount(amount: f64) -> String {
    if (amount - amount.round()).abs() < OCCUPANCY_TOLERANCE {
        format!("{}", amount.round() as i64)
    } else {
        let text = format!("{:.4}", amount);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
