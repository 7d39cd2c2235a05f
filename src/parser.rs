use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while1},
    character::complete::{char, space0, space1, u32 as net_number, u8 as pin_number},
    combinator::{all_consuming, map, map_res},
    multi::many0,
    sequence::{pair, preceded, separated_pair, terminated},
    IResult,
};
use std::fs;
use anyhow::{anyhow, Context, Result};
use log::{debug, info};

use crate::circuit::{Circuit, ComponentId, ComponentKind};
use crate::error::CircuitError;
use crate::nets::NetId;

/// `designator:pin` reference in a wire statement
#[derive(Debug, Clone, PartialEq)]
pub struct PinRef {
    pub component: String,
    pub pin: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `resistor R-1 value=1k`
    Component {
        kind: ComponentKind,
        designator: Option<String>,
        attributes: Vec<(String, f64)>,
    },
    /// `wire R-1:2 C-1:1`
    Wire { sta: PinRef, end: PinRef },
    /// `unwire wire-3`
    Unwire(String),
    /// `delete R-1`
    Delete(String),
    /// `rename 3 7`
    Rename { old: NetId, new: NetId },
}

/// Parsed circuit script, statements tagged with their line number
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub title: String,
    pub statements: Vec<(usize, Statement)>,
}

impl Script {
    /// Replay the statements against a fresh circuit.
    pub fn build(&self) -> Result<Circuit> {
        let mut circuit = Circuit::new(self.title.clone());
        for (line, statement) in &self.statements {
            apply(&mut circuit, statement).with_context(|| format!("line {}", line))?;
        }
        info!(
            "Built circuit '{}' with {} components and {} wires",
            circuit.title,
            circuit.components().count(),
            circuit.wires().count()
        );
        Ok(circuit)
    }
}

fn apply(circuit: &mut Circuit, statement: &Statement) -> Result<()> {
    match statement {
        Statement::Component { kind, designator, attributes } => {
            let id = circuit.add_component(*kind, designator.as_deref());
            for (key, value) in attributes {
                circuit.set_attribute(id, key, *value)?;
            }
        }
        Statement::Wire { sta, end } => {
            let sta_id = resolve(circuit, &sta.component)?;
            let end_id = resolve(circuit, &end.component)?;
            circuit.add_connector(sta_id, sta.pin, end_id, end.pin)?;
        }
        Statement::Unwire(designator) => {
            let id = circuit
                .wire_by_designator(designator)
                .map(|w| w.id)
                .ok_or_else(|| CircuitError::UnknownWire(designator.clone()))?;
            circuit.delete_connector(id)?;
        }
        Statement::Delete(reference) => {
            let id = resolve(circuit, reference)?;
            circuit.delete_component(id)?;
        }
        Statement::Rename { old, new } => circuit.change_net_id(*old, *new)?,
    }
    Ok(())
}

fn resolve(circuit: &Circuit, reference: &str) -> Result<ComponentId, CircuitError> {
    circuit
        .resolve(reference)
        .ok_or_else(|| CircuitError::UnknownComponent(reference.to_string()))
}

pub struct ScriptParser;

impl Default for ScriptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptParser {
    pub fn new() -> Self {
        ScriptParser
    }

    pub fn parse_file(&self, filename: &str) -> Result<Script> {
        let content = fs::read_to_string(filename)
            .map_err(|e| anyhow!("Failed to read file '{}': {}", filename, e))?;

        self.parse(&content)
    }

    pub fn parse(&self, content: &str) -> Result<Script> {
        let mut script = Script::default();

        for (line_num, line) in self.preprocess_lines(content) {
            let lower = line.to_lowercase();
            if lower == ".end" {
                break;
            }
            if lower.starts_with(".title") {
                script.title = line[".title".len()..].trim().to_string();
                continue;
            }
            if line.starts_with('.') {
                return Err(anyhow!("line {}: unknown directive '{}'", line_num, line));
            }

            let (_, statement) = parse_statement(&line)
                .map_err(|e| anyhow!("line {}: cannot parse '{}': {}", line_num, line, e))?;
            debug!("line {}: {:?}", line_num, statement);
            script.statements.push((line_num, statement));
        }

        Ok(script)
    }

    /// Drop blank lines and comments, join `+` continuations. Keeps 1-based line numbers.
    fn preprocess_lines(&self, content: &str) -> Vec<(usize, String)> {
        let mut processed_lines = Vec::new();
        let mut current: Option<(usize, String)> = None;

        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('*') || line.starts_with(';') {
                continue;
            }

            if let Some(rest) = line.strip_prefix('+') {
                if let Some((_, current_line)) = current.as_mut() {
                    current_line.push(' ');
                    current_line.push_str(rest.trim());
                    continue;
                }
            }

            if let Some(done) = current.replace((idx + 1, line.to_string())) {
                processed_lines.push(done);
            }
        }

        if let Some(done) = current {
            processed_lines.push(done);
        }

        processed_lines
    }
}

fn parse_statement(input: &str) -> IResult<&str, Statement> {
    all_consuming(terminated(
        alt((
            parse_wire,
            parse_unwire,
            parse_delete,
            parse_rename,
            parse_component,
        )),
        space0,
    ))(input)
}

fn parse_reference(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-')(input)
}

fn parse_pin_ref(input: &str) -> IResult<&str, PinRef> {
    map(
        separated_pair(parse_reference, char(':'), pin_number),
        |(component, pin)| PinRef {
            component: component.to_string(),
            pin,
        },
    )(input)
}

fn parse_wire(input: &str) -> IResult<&str, Statement> {
    map(
        preceded(
            pair(tag_no_case("wire"), space1),
            separated_pair(parse_pin_ref, space1, parse_pin_ref),
        ),
        |(sta, end)| Statement::Wire { sta, end },
    )(input)
}

fn parse_unwire(input: &str) -> IResult<&str, Statement> {
    map(
        preceded(pair(tag_no_case("unwire"), space1), parse_reference),
        |designator: &str| Statement::Unwire(designator.to_string()),
    )(input)
}

fn parse_delete(input: &str) -> IResult<&str, Statement> {
    map(
        preceded(pair(tag_no_case("delete"), space1), parse_reference),
        |reference: &str| Statement::Delete(reference.to_string()),
    )(input)
}

fn parse_rename(input: &str) -> IResult<&str, Statement> {
    map(
        preceded(
            pair(tag_no_case("rename"), space1),
            separated_pair(net_number, space1, net_number),
        ),
        |(old, new)| Statement::Rename { old, new },
    )(input)
}

#[derive(Debug)]
enum ComponentItem {
    Designator(String),
    Attribute(String, f64),
}

fn parse_attribute(input: &str) -> IResult<&str, (String, f64)> {
    map_res(
        separated_pair(
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            char('='),
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '+'),
        ),
        |(key, value): (&str, &str)| parse_value_with_unit(value).map(|v| (key.to_string(), v)),
    )(input)
}

fn parse_component(input: &str) -> IResult<&str, Statement> {
    let (input, kind) = map_res(
        take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        |name: &str| name.parse::<ComponentKind>(),
    )(input)?;
    let (input, items) = many0(preceded(
        space1,
        alt((
            map(parse_attribute, |(key, value)| ComponentItem::Attribute(key, value)),
            map(parse_reference, |r: &str| ComponentItem::Designator(r.to_string())),
        )),
    ))(input)?;

    let mut designator = None;
    let mut attributes = Vec::new();
    for item in items {
        match item {
            ComponentItem::Attribute(key, value) => attributes.push((key, value)),
            ComponentItem::Designator(name) if designator.is_none() => designator = Some(name),
            ComponentItem::Designator(_) => {
                return Err(nom::Err::Failure(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Verify,
                )))
            }
        }
    }

    Ok((input, Statement::Component { kind, designator, attributes }))
}

/// Parse value with unit suffix (e.g., 1k, 1meg, 1m, 1u, 1n, 1p)
pub fn parse_value_with_unit(value_str: &str) -> Result<f64> {
    let value_str = value_str.trim().to_lowercase();

    let parsed = if let Some(num_str) = value_str.strip_suffix("meg") {
        num_str.parse::<f64>().map(|v| v * 1e6)
    } else if let Some(num_str) = value_str.strip_suffix('t') {
        num_str.parse::<f64>().map(|v| v * 1e12)
    } else if let Some(num_str) = value_str.strip_suffix('g') {
        num_str.parse::<f64>().map(|v| v * 1e9)
    } else if let Some(num_str) = value_str.strip_suffix('k') {
        num_str.parse::<f64>().map(|v| v * 1e3)
    } else if let Some(num_str) = value_str.strip_suffix('m') {
        num_str.parse::<f64>().map(|v| v * 1e-3)
    } else if let Some(num_str) = value_str.strip_suffix('u') {
        num_str.parse::<f64>().map(|v| v * 1e-6)
    } else if let Some(num_str) = value_str.strip_suffix('n') {
        num_str.parse::<f64>().map(|v| v * 1e-9)
    } else if let Some(num_str) = value_str.strip_suffix('p') {
        num_str.parse::<f64>().map(|v| v * 1e-12)
    } else if let Some(num_str) = value_str.strip_suffix('f') {
        num_str.parse::<f64>().map(|v| v * 1e-15)
    } else {
        value_str.parse::<f64>()
    };

    parsed.map_err(|e| anyhow!("Invalid value '{}': {}", value_str, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Terminal;

    const DIVIDER: &str = "\
* Voltage divider
.title Divider
voltage_dc Udc-1 value=5
resistor R-1 value=1k
resistor R-2
+ value=2.2k
ground
wire Udc-1:1 R-1:1
wire R-1:2 R-2:1
wire R-2:2 G-1:1
wire Udc-1:2 ground-1:1
.end
resistor R-9
";

    #[test]
    fn test_preprocess_lines() {
        let parser = ScriptParser::new();
        let lines = parser.preprocess_lines(DIVIDER);
        assert_eq!(lines[0], (2, ".title Divider".to_string()));
        assert_eq!(lines[3], (5, "resistor R-2 value=2.2k".to_string()));
        assert_eq!(lines[4].0, 7);
    }

    #[test]
    fn test_parse_statements() {
        assert_eq!(
            parse_statement("wire R-1:2 C-1:1").unwrap().1,
            Statement::Wire {
                sta: PinRef { component: "R-1".to_string(), pin: 2 },
                end: PinRef { component: "C-1".to_string(), pin: 1 },
            }
        );
        assert_eq!(
            parse_statement("rename 3 7").unwrap().1,
            Statement::Rename { old: 3, new: 7 }
        );
        assert_eq!(
            parse_statement("unwire wire-2 ").unwrap().1,
            Statement::Unwire("wire-2".to_string())
        );
        assert_eq!(
            parse_statement("capacitor Uc=0.5 C-3 value=1u").unwrap().1,
            Statement::Component {
                kind: ComponentKind::Capacitor,
                designator: Some("C-3".to_string()),
                attributes: vec![("Uc".to_string(), 0.5), ("value".to_string(), 1e-6)],
            }
        );
        assert!(parse_statement("resistor R-1 R-2").is_err());
        assert!(parse_statement("transistor Q-1").is_err());
        assert!(parse_statement("wire R-1:2").is_err());
    }

    #[test]
    fn test_parse_script() {
        let script = ScriptParser::new().parse(DIVIDER).unwrap();
        assert_eq!(script.title, "Divider");
        assert_eq!(script.statements.len(), 8);
        assert!(ScriptParser::new().parse(".op\n").is_err());
    }

    #[test]
    fn test_build_and_compile() {
        let script = ScriptParser::new().parse(DIVIDER).unwrap();
        let mut circuit = script.build().unwrap();
        assert_eq!(circuit.title, "Divider");
        assert!(circuit.resolve("R-9").is_none());

        let r2 = circuit.resolve("R-2").unwrap();
        assert_eq!(circuit.component(r2).unwrap().attributes["value"], 2200.0);
        assert_eq!(circuit.terminal_net(Terminal::new(r2, 1)), Some(2));

        circuit.compile().unwrap();
        assert_eq!(circuit.get_netlist().unwrap().len(), 3);
    }

    #[test]
    fn test_build_reports_line() {
        let script = ScriptParser::new()
            .parse("resistor R-1\nresistor R-2\nwire R-1:1 R-2:1\nwire R-1:2 R-2:2\nwire R-1:1 R-1:2\n")
            .unwrap();
        let err = script.build().unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.starts_with("line 5"));
        assert!(message.contains("different nets"));
    }

    #[test]
    fn test_parse_value_with_unit() {
        assert_eq!(parse_value_with_unit("1k").unwrap(), 1000.0);
        assert_eq!(parse_value_with_unit("1.5meg").unwrap(), 1.5e6);
        assert_eq!(parse_value_with_unit("10m").unwrap(), 10e-3);
        assert_eq!(parse_value_with_unit("1u").unwrap(), 1e-6);
        assert_eq!(parse_value_with_unit("-90").unwrap(), -90.0);
        assert!(parse_value_with_unit("abc").is_err());
    }
}
