//! SVG rendition of a lineage. Vertices are written in pixel coordinates, one
//! `<path>` per gene in paint order; lineage metadata rides in a namespaced
//! element inside `<desc>` so the file can be loaded back.

use std::collections::HashMap;

use svg::node::element::path::{Command, Data, Position};
use svg::node::element::tag::Type;
use svg::node::element::{Element, Path};
use svg::node::Text;
use svg::parser::Event;
use svg::{Document, Node};

use super::{alpha_from_fraction, SavedLineage};
use crate::dna::{Color, Gene, Genome, LineageStats, Point};
use crate::error::{BreedError, Result};
use crate::settings::Deltas;

const NS: &str = "urn:polybreed:lineage";
const META_TAG: &str = "polybreed:lineage";

pub fn to_string(lineage: &SavedLineage) -> String {
    to_document(lineage).to_string()
}

pub fn to_document(lineage: &SavedLineage) -> Document {
    let genome = &lineage.genome;
    let (w, h) = (genome.width(), genome.height());
    let stats = &lineage.stats;

    let mut title = Element::new("title");
    title.append(Text::new(format!(
        "Mutation {} out of {}",
        stats.selected, stats.generation
    )));

    let mut meta = Element::new(META_TAG);
    meta.assign("datetime", lineage.datetime.clone());
    meta.assign("elapsed-secs", stats.elapsed_secs.to_string());
    meta.assign("generation", stats.generation.to_string());
    meta.assign("selected", stats.selected.to_string());
    meta.assign("fitness", stats.fitness.to_string());
    meta.assign("dxy", lineage.deltas.xy.to_string());
    meta.assign("dr", lineage.deltas.r.to_string());
    meta.assign("dg", lineage.deltas.g.to_string());
    meta.assign("db", lineage.deltas.b.to_string());
    meta.assign("da", lineage.deltas.a.to_string());

    let mut desc = Element::new("desc");
    desc.append(meta);

    let mut document = Document::new()
        .set("xmlns:polybreed", NS)
        .set("width", w)
        .set("height", h)
        .set("viewBox", format!("0 0 {w} {h}"))
        .add(title)
        .add(desc);

    for gene in &genome.genes {
        let Some((&(x0, y0), rest)) = gene.vertices.split_first() else {
            continue;
        };
        let mut data = Data::new().move_to(((x0 * w as f64) as f32, (y0 * h as f64) as f32));
        for &(x, y) in rest {
            data = data.line_to(((x * w as f64) as f32, (y * h as f64) as f32));
        }
        let c = gene.color;
        let path = Path::new()
            .set("d", data.close())
            .set("fill", format!("rgb({},{},{})", c.r, c.g, c.b))
            .set("fill-opacity", c.alpha_f())
            .set("fill-rule", "evenodd");
        document = document.add(path);
    }

    document
}

pub fn from_str(text: &str) -> Result<SavedLineage> {
    let parser = svg::read(text).map_err(|e| BreedError::Parse(e.to_string()))?;

    let mut size: Option<(u32, u32)> = None;
    let mut meta: Option<HashMap<String, String>> = None;
    let mut raw_genes: Vec<(Vec<(f64, f64)>, Color)> = Vec::new();

    for event in parser {
        match event {
            Event::Error(e) => return Err(BreedError::Parse(e.to_string())),
            Event::Tag("svg", Type::Start, attrs) => {
                let get = |k: &str| attrs.get(k).map(|v| v.to_string());
                let width = parse_dim(get("width"), "width")?;
                let height = parse_dim(get("height"), "height")?;
                size = Some((width, height));
            }
            Event::Tag(META_TAG, Type::Start | Type::Empty, attrs) => {
                meta = Some(attrs.iter().map(|(k, v)| (k.clone(), v.to_string())).collect());
            }
            Event::Tag("path", Type::Start | Type::Empty, attrs) => {
                let d = attrs
                    .get("d")
                    .ok_or_else(|| BreedError::Parse("path without d".into()))?;
                let vertices = parse_path(&d.to_string())?;
                let fill = attrs.get("fill").map(|v| v.to_string()).unwrap_or_default();
                let opacity = attrs
                    .get("fill-opacity")
                    .map(|v| parse_field::<f64>(&v.to_string(), "fill-opacity"))
                    .transpose()?
                    .unwrap_or(1.0);
                let (r, g, b) = parse_rgb(&fill)?;
                raw_genes.push((vertices, Color::rgba(r, g, b, alpha_from_fraction(opacity))));
            }
            _ => {}
        }
    }

    let (width, height) = size.ok_or_else(|| BreedError::Parse("no <svg> element".into()))?;
    let meta = meta.ok_or_else(|| BreedError::Parse(format!("no <{META_TAG}> metadata")))?;
    let field = |k: &str| {
        meta.get(k)
            .map(String::as_str)
            .ok_or_else(|| BreedError::Parse(format!("metadata missing {k}")))
    };

    let stats = LineageStats {
        generation: parse_field(field("generation")?, "generation")?,
        selected: parse_field(field("selected")?, "selected")?,
        fitness: parse_field(field("fitness")?, "fitness")?,
        elapsed_secs: meta
            .get("elapsed-secs")
            .map(|s| parse_field(s, "elapsed-secs"))
            .transpose()?
            .unwrap_or(0.0),
    };
    if stats.selected > stats.generation {
        return Err(BreedError::Parse(format!(
            "selected {} exceeds generation {}",
            stats.selected, stats.generation
        )));
    }

    let defaults = Deltas::default();
    let opt = |k: &str| meta.get(k).map(String::as_str);
    let deltas = Deltas {
        xy: opt("dxy").map(|s| parse_field(s, "dxy")).transpose()?.unwrap_or(defaults.xy),
        r: opt("dr").map(|s| parse_field(s, "dr")).transpose()?.unwrap_or(defaults.r),
        g: opt("dg").map(|s| parse_field(s, "dg")).transpose()?.unwrap_or(defaults.g),
        b: opt("db").map(|s| parse_field(s, "db")).transpose()?.unwrap_or(defaults.b),
        a: opt("da").map(|s| parse_field(s, "da")).transpose()?.unwrap_or(defaults.a),
    };

    let (fw, fh) = (width as f64, height as f64);
    let genes = raw_genes
        .into_iter()
        .map(|(px, color)| {
            let vertices: Vec<Point> = px.into_iter().map(|(x, y)| (x / fw, y / fh)).collect();
            Gene::new(vertices, color)
        })
        .collect();
    let genome = Genome::from_genes(width, height, genes).map_err(|e| BreedError::Parse(e.to_string()))?;

    Ok(SavedLineage {
        datetime: meta.get("datetime").cloned().unwrap_or_default(),
        stats,
        deltas,
        genome,
    })
}

fn parse_field<T: std::str::FromStr>(s: &str, what: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    s.trim()
        .parse()
        .map_err(|e| BreedError::Parse(format!("{what}: {e}")))
}

fn parse_dim(s: Option<String>, what: &str) -> Result<u32> {
    let s = s.ok_or_else(|| BreedError::Parse(format!("<svg> without {what}")))?;
    parse_field(s.trim_end_matches("px"), what)
}

/// `rgb(r,g,b)`
fn parse_rgb(s: &str) -> Result<(u8, u8, u8)> {
    let inner = s
        .trim()
        .strip_prefix("rgb(")
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| BreedError::Parse(format!("unsupported fill {s:?}")))?;
    let mut it = inner.split(',').map(|c| parse_field::<u8>(c, "fill"));
    match (it.next(), it.next(), it.next(), it.next()) {
        (Some(r), Some(g), Some(b), None) => Ok((r?, g?, b?)),
        _ => Err(BreedError::Parse(format!("unsupported fill {s:?}"))),
    }
}

/// vertex list of a move/line/close path, absolute or relative
fn parse_path(d: &str) -> Result<Vec<(f64, f64)>> {
    let data = Data::parse(d).map_err(|e| BreedError::Parse(e.to_string()))?;
    let mut out = Vec::new();
    let mut cursor = (0.0f64, 0.0f64);
    for command in data.iter() {
        let (position, params) = match command {
            Command::Move(p, params) | Command::Line(p, params) => (p, params),
            Command::Close => continue,
            other => {
                return Err(BreedError::Parse(format!("unsupported path command {other:?}")));
            }
        };
        if params.len() % 2 != 0 {
            return Err(BreedError::Parse("odd coordinate count in path".into()));
        }
        for xy in params.chunks_exact(2) {
            let (x, y) = (xy[0] as f64, xy[1] as f64);
            cursor = match position {
                Position::Absolute => (x, y),
                Position::Relative => (cursor.0 + x, cursor.1 + y),
            };
            out.push(cursor);
        }
    }
    Ok(out)
}
