use drxas_types::DrXasError;

const BOND_TOLERANCE: f64 = 1.15;
const DEFAULT_RADIUS: f64 = 1.5;

#[derive(Clone, Debug, PartialEq)]
pub struct Atom {
    pub element: String,
    /// Cartesian position in ångström.
    pub position: [f64; 3],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitCell {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl UnitCell {
    pub fn to_cartesian(&self, fract: [f64; 3]) -> [f64; 3] {
        let (alpha, beta, gamma) = (
            self.alpha.to_radians(),
            self.beta.to_radians(),
            self.gamma.to_radians(),
        );

        let bx = self.b * gamma.cos();
        let by = self.b * gamma.sin();
        let cx = self.c * beta.cos();
        let cy = self.c * (alpha.cos() - beta.cos() * gamma.cos()) / gamma.sin();
        let cz = (self.c * self.c - cx * cx - cy * cy).max(0.0).sqrt();

        let [x, y, z] = fract;
        return [self.a * x + bx * y + cx * z, by * y + cy * z, cz * z];
    }
}

/// A crystal structure decoded from a CIF file, ready to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct StructureModel {
    pub name: String,
    pub cell: UnitCell,
    pub atoms: Vec<Atom>,
    pub bonds: Vec<(usize, usize)>,
}

impl StructureModel {
    pub fn parse_cif(name: &str, text: &str) -> Result<StructureModel, DrXasError> {
        let mut block_name = name.to_string();
        let mut cell = [None; 6];
        let mut atoms: Vec<Atom> = vec![];
        let mut fractional: Vec<(String, [f64; 3])> = vec![];

        let lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect::<Vec<&str>>();

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];

            if let Some(block) = line.strip_prefix("data_") {
                if !block.is_empty() {
                    block_name = block.to_string();
                }
                i += 1;
                continue;
            }

            if line.eq_ignore_ascii_case("loop_") {
                i += 1;
                let mut headers: Vec<String> = vec![];
                while i < lines.len() && lines[i].starts_with('_') {
                    headers.push(lines[i].to_ascii_lowercase());
                    i += 1;
                }

                let mut values: Vec<String> = vec![];
                while i < lines.len() && !is_loop_terminator(lines[i]) {
                    values.extend(tokenize(lines[i]));
                    i += 1;
                }

                if headers.iter().any(|h| h == "_atom_site_fract_x") {
                    fractional.extend(atom_sites(&headers, &values));
                }
                continue;
            }

            if line.starts_with('_') {
                let tokens = tokenize(line);
                if let (Some(key), Some(value)) = (tokens.first(), tokens.get(1)) {
                    let slot = match key.to_ascii_lowercase().as_str() {
                        "_cell_length_a" => Some(0),
                        "_cell_length_b" => Some(1),
                        "_cell_length_c" => Some(2),
                        "_cell_angle_alpha" => Some(3),
                        "_cell_angle_beta" => Some(4),
                        "_cell_angle_gamma" => Some(5),
                        _ => None,
                    };
                    if let Some(slot) = slot {
                        cell[slot] = parse_number(value);
                    }
                }
            }

            i += 1;
        }

        let [Some(a), Some(b), Some(c), alpha, beta, gamma] = cell else {
            return Err(DrXasError::validation(format!(
                "{name}: missing cell parameters"
            )));
        };
        let cell = UnitCell {
            a,
            b,
            c,
            alpha: alpha.unwrap_or(90.0),
            beta: beta.unwrap_or(90.0),
            gamma: gamma.unwrap_or(90.0),
        };

        if fractional.is_empty() {
            return Err(DrXasError::validation(format!("{name}: no atom sites")));
        }

        for (element, fract) in fractional {
            atoms.push(Atom {
                element,
                position: cell.to_cartesian(fract),
            });
        }

        let bonds = find_bonds(&atoms);
        return Ok(StructureModel {
            name: block_name,
            cell,
            atoms,
            bonds,
        });
    }

    /// Distinct elements in order of first appearance.
    pub fn elements(&self) -> Vec<&str> {
        let mut elements: Vec<&str> = vec![];
        for atom in &self.atoms {
            if !elements.contains(&atom.element.as_str()) {
                elements.push(&atom.element);
            }
        }

        return elements;
    }
}

fn is_loop_terminator(line: &str) -> bool {
    return line.starts_with('_')
        || line.eq_ignore_ascii_case("loop_")
        || line.starts_with("data_");
}

fn atom_sites(headers: &[String], values: &[String]) -> Vec<(String, [f64; 3])> {
    let column = |name: &str| headers.iter().position(|h| h == name);
    let (Some(x), Some(y), Some(z)) = (
        column("_atom_site_fract_x"),
        column("_atom_site_fract_y"),
        column("_atom_site_fract_z"),
    ) else {
        return vec![];
    };
    let symbol = column("_atom_site_type_symbol").or_else(|| column("_atom_site_label"));

    return values
        .chunks(headers.len())
        .filter(|row| row.len() == headers.len())
        .filter_map(|row| {
            let element = symbol
                .map(|s| element_symbol(&row[s]))
                .unwrap_or_else(|| "X".to_string());
            let position = [
                parse_number(&row[x])?,
                parse_number(&row[y])?,
                parse_number(&row[z])?,
            ];
            return Some((element, position));
        })
        .collect();
}

/// Splits a CIF line on whitespace, keeping quoted values whole.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens: Vec<String> = vec![];
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '\'' || c == '"' {
            chars.next();
            let token = chars.by_ref().take_while(|&n| n != c).collect::<String>();
            tokens.push(token);
            continue;
        }

        let mut token = String::new();
        while let Some(&n) = chars.peek() {
            if n.is_whitespace() {
                break;
            }
            token.push(n);
            chars.next();
        }
        tokens.push(token);
    }

    return tokens;
}

/// Parses a CIF number, dropping any standard uncertainty such as `3.524(2)`.
fn parse_number(value: &str) -> Option<f64> {
    let value = value.split('(').next().unwrap_or_default();
    return value.parse::<f64>().ok();
}

/// `Ni2+` or `Ni1` become `Ni`.
fn element_symbol(label: &str) -> String {
    let mut chars = label.chars().skip_while(|c| !c.is_ascii_alphabetic());
    let mut symbol = String::new();
    if let Some(first) = chars.next() {
        symbol.push(first.to_ascii_uppercase());
        if let Some(second) = chars.next().filter(|c| c.is_ascii_lowercase()) {
            symbol.push(second);
        }
    }
    if symbol.is_empty() {
        return "X".to_string();
    }

    return symbol;
}

fn covalent_radius(element: &str) -> f64 {
    match element {
        "H" => return 0.31,
        "C" => return 0.76,
        "N" => return 0.71,
        "O" => return 0.66,
        "F" => return 0.57,
        "Na" => return 1.66,
        "Mg" => return 1.41,
        "Al" => return 1.21,
        "Si" => return 1.11,
        "P" => return 1.07,
        "S" => return 1.05,
        "Cl" => return 1.02,
        "K" => return 2.03,
        "Ca" => return 1.76,
        "Ti" => return 1.60,
        "V" => return 1.53,
        "Cr" => return 1.39,
        "Mn" => return 1.39,
        "Fe" => return 1.32,
        "Co" => return 1.26,
        "Ni" => return 1.24,
        "Cu" => return 1.32,
        "Zn" => return 1.22,
        "Pt" => return 1.36,
        "Au" => return 1.36,
        _ => return DEFAULT_RADIUS,
    }
}

fn find_bonds(atoms: &[Atom]) -> Vec<(usize, usize)> {
    let mut bonds = vec![];
    for i in 0..atoms.len() {
        for j in (i + 1)..atoms.len() {
            let [ax, ay, az] = atoms[i].position;
            let [bx, by, bz] = atoms[j].position;
            let distance = ((ax - bx).powi(2) + (ay - by).powi(2) + (az - bz).powi(2)).sqrt();
            let limit = (covalent_radius(&atoms[i].element)
                + covalent_radius(&atoms[j].element))
                * BOND_TOLERANCE;
            if distance > 0.1 && distance <= limit {
                bonds.push((i, j));
            }
        }
    }

    return bonds;
}
