use crate::io::section::number;
use crate::io::{Format, error::Error};
use crate::model::molecule::Molecule;
use log::{debug, warn};
use std::io::BufRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    velocities: bool,
    box_lengths: bool,
    box_angles: bool,
}

impl Layout {
    const fn new(velocities: bool, box_lengths: bool, box_angles: bool) -> Self {
        Self {
            velocities,
            box_lengths,
            box_angles,
        }
    }

    fn len(&self, n: usize) -> usize {
        let per_atom = if self.velocities { 6 } else { 3 };
        let cell = match (self.box_lengths, self.box_angles) {
            (true, true) => 6,
            (true, false) => 3,
            _ => 0,
        };
        per_atom * n + cell
    }
}

// Tried in order; the first layout whose size matches the token count wins.
const LAYOUTS: [Layout; 6] = [
    Layout::new(true, true, true),
    Layout::new(false, true, true),
    Layout::new(true, true, false),
    Layout::new(false, true, false),
    Layout::new(true, false, false),
    Layout::new(false, false, false),
];

fn layout_for(tokens: usize, n: usize) -> Option<Layout> {
    LAYOUTS.iter().copied().find(|l| l.len(n) == tokens)
}

/// Reads an RST7 restart file into a record already holding its PARM7
/// topology: coordinates, and velocities and box when present.
///
/// The atom count on line 2 must match the record.
pub fn read_into(reader: &mut dyn BufRead, mol: &mut Molecule) -> Result<(), Error> {
    let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;

    let counts = lines
        .get(1)
        .ok_or_else(|| Error::parse(Format::Rst7, 2, "missing atom count line"))?;
    let mut parts = counts.split_whitespace();
    let n: usize = number(
        Format::Rst7,
        2,
        parts
            .next()
            .ok_or_else(|| Error::parse(Format::Rst7, 2, "missing atom count"))?,
        "atom count",
    )?;
    if n != mol.no_atoms {
        return Err(Error::count_mismatch(Format::Rst7, "atom count", mol.no_atoms, n));
    }
    if let Some(time) = parts.next() {
        mol.amber.time = Some(number(Format::Rst7, 2, time, "time")?);
    }
    if let Some(temperature) = parts.next() {
        mol.amber.temperature = Some(number(Format::Rst7, 2, temperature, "temperature")?);
    }

    let mut values = Vec::with_capacity(6 * n + 6);
    for (i, line) in lines.iter().enumerate().skip(2) {
        for token in line.split_whitespace() {
            values.push(number::<f64>(Format::Rst7, i + 1, token, "coordinate")?);
        }
    }

    if values.len() < 3 * n {
        return Err(Error::parse(
            Format::Rst7,
            lines.len(),
            format!("{} values for {n} atoms, need at least {}", values.len(), 3 * n),
        ));
    }

    let layout = layout_for(values.len(), n).unwrap_or_else(|| {
        warn!(
            "RST7 has {} values for {n} atoms, which matches no known layout; reading coordinates only",
            values.len()
        );
        Layout::new(values.len() >= 6 * n, false, false)
    });
    debug!("RST7 layout {layout:?} for {n} atoms");

    let (coords, rest) = values.split_at(3 * n);
    mol.atom_x = coords.iter().step_by(3).copied().collect();
    mol.atom_y = coords.iter().skip(1).step_by(3).copied().collect();
    mol.atom_z = coords.iter().skip(2).step_by(3).copied().collect();

    let rest = if layout.velocities {
        let (vel, rest) = rest.split_at(3 * n);
        mol.atom_vx = vel.iter().step_by(3).copied().collect();
        mol.atom_vy = vel.iter().skip(1).step_by(3).copied().collect();
        mol.atom_vz = vel.iter().skip(2).step_by(3).copied().collect();
        rest
    } else {
        rest
    };

    if layout.box_lengths {
        mol.box_x = rest[0];
        mol.box_y = rest[1];
        mol.box_z = rest[2];
    }
    if layout.box_angles {
        mol.box_alpha = rest[3];
        mol.box_beta = rest[4];
        mol.box_gamma = rest[5];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn two_atoms() -> Molecule {
        let mut mol = Molecule::new();
        mol.no_atoms = 2;
        mol
    }

    fn read(text: &str) -> Result<Molecule, Error> {
        let mut mol = two_atoms();
        read_into(&mut Cursor::new(text), &mut mol)?;
        Ok(mol)
    }

    #[test]
    fn coordinates_only() {
        let mol = read("t\n2\n1 2 3 4 5 6\n").unwrap();
        assert_eq!(mol.atom_x, vec![1.0, 4.0]);
        assert_eq!(mol.atom_y, vec![2.0, 5.0]);
        assert_eq!(mol.atom_z, vec![3.0, 6.0]);
        assert!(mol.atom_vx.is_empty());
        assert_eq!(mol.box_x, 0.0);
    }

    #[test]
    fn time_and_temperature_are_optional() {
        let mol = read("t\n    2  10.5  300.0\n1 2 3 4 5 6\n").unwrap();
        assert_eq!(mol.amber.time, Some(10.5));
        assert_eq!(mol.amber.temperature, Some(300.0));
    }

    #[test]
    fn velocities_box_lengths_and_angles() {
        let text = "t\n2\n1 2 3 4 5 6\n0.1 0.2 0.3 0.4 0.5 0.6\n30 31 32 90 100 120\n";
        let mol = read(text).unwrap();
        assert_eq!(mol.atom_vx, vec![0.1, 0.4]);
        assert_eq!(mol.atom_vz, vec![0.3, 0.6]);
        assert_eq!((mol.box_x, mol.box_y, mol.box_z), (30.0, 31.0, 32.0));
        assert_eq!(
            (mol.box_alpha, mol.box_beta, mol.box_gamma),
            (90.0, 100.0, 120.0)
        );
    }

    #[test]
    fn box_lengths_without_angles() {
        let mol = read("t\n2\n1 2 3 4 5 6\n30 31 32\n").unwrap();
        assert!(mol.atom_vx.is_empty());
        assert_eq!((mol.box_x, mol.box_y, mol.box_z), (30.0, 31.0, 32.0));
        assert_eq!(mol.box_gamma, 90.0);
    }

    #[test]
    fn box_with_angles_wins_over_velocities_of_equal_size() {
        // 3n + 6 == 6n for two atoms
        let mol = read("t\n2\n1 2 3 4 5 6\n30 31 32 90 90 60\n").unwrap();
        assert!(mol.atom_vx.is_empty());
        assert_eq!(mol.box_gamma, 60.0);
    }

    #[test]
    fn velocities_with_box_lengths() {
        let layout = layout_for(15, 2).unwrap();
        assert_eq!(layout, Layout::new(true, true, false));
        assert_eq!(layout_for(7, 2), None);
    }

    #[test]
    fn unknown_layout_reads_coordinates() {
        let mol = read("t\n2\n1 2 3 4 5 6 7\n").unwrap();
        assert_eq!(mol.atom_x, vec![1.0, 4.0]);
        assert!(mol.atom_vx.is_empty());
    }

    #[test]
    fn too_few_values_is_fatal() {
        assert!(matches!(
            read("t\n2\n1 2 3 4 5\n"),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn atom_count_must_match_topology() {
        assert!(matches!(
            read("t\n3\n1 2 3 4 5 6 7 8 9\n"),
            Err(Error::CountMismatch {
                expected: 2,
                found: 3,
                ..
            })
        ));
    }
}
