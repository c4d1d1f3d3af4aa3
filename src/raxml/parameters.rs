use std::collections::BTreeMap;
use std::fmt::Display;

use anyhow::bail;
use itertools::Itertools;
use lazy_static::lazy_static;

use crate::errors::DataError;
use crate::Result;

/// User supplied parameters, flag -> value. Flag parameters such as `-k` are switched on by
/// any value other than `false`.
pub type ParamMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Switch without a value, e.g. `-k`.
    Flag,
    /// Flag followed by a value, e.g. `-m GTRCAT`.
    Valued,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: &'static str,
    pub kind: ParameterKind,
    on: bool,
    value: Option<String>,
}

impl Parameter {
    fn new(name: &'static str, kind: ParameterKind, default: Option<&str>) -> Self {
        Self {
            name,
            kind,
            on: default.is_some(),
            value: default.map(str::to_string),
        }
    }

    /// Switches the parameter on. The value is ignored for flag parameters.
    pub fn on(&mut self, value: impl Display) {
        self.on = true;
        if self.kind == ParameterKind::Valued {
            self.value = Some(value.to_string());
        }
    }

    pub fn off(&mut self) {
        self.on = false;
        self.value = None;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn is_off(&self) -> bool {
        !self.on
    }

    pub fn value(&self) -> Option<&str> {
        if self.on {
            self.value.as_deref()
        } else {
            None
        }
    }

    /// Command-line fragment for the parameter, `None` when it is off.
    pub fn render(&self) -> Option<String> {
        match (self.on, self.kind, &self.value) {
            (false, _, _) => None,
            (true, ParameterKind::Flag, _) => Some(self.name.to_string()),
            (true, ParameterKind::Valued, Some(value)) => Some(format!("{} {}", self.name, value)),
            (true, ParameterKind::Valued, None) => None,
        }
    }
}

use ParameterKind::{Flag, Valued};

lazy_static! {
    /// Every raxmlHPC 7.2.6 parameter in rendering order, with its default value.
    static ref PARAMETER_TABLE: Vec<(&'static str, ParameterKind, Option<&'static str>)> = vec![
        ("-A", Valued, Some("S16")),
        ("-B", Valued, Some("0.03")),
        ("-O", Valued, Some("3600.0")),
        ("-K", Valued, Some("GTR")),
        ("-e", Valued, Some("0.1")),
        ("-f", Valued, Some("d")),
        ("-a", Valued, None),
        ("-b", Valued, None),
        ("-d", Flag, None),
        ("-D", Flag, None),
        ("-E", Valued, None),
        ("-F", Flag, None),
        ("-g", Valued, None),
        ("-h", Flag, None),
        ("-i", Valued, None),
        ("-I", Valued, None),
        ("-j", Flag, None),
        ("-k", Flag, None),
        ("-l", Valued, None),
        ("-L", Valued, None),
        ("-m", Valued, None),
        ("-M", Flag, None),
        ("-n", Valued, None),
        ("-o", Valued, None),
        ("-p", Valued, None),
        ("-P", Valued, None),
        ("-q", Valued, None),
        ("-r", Valued, None),
        ("-R", Valued, None),
        ("-S", Valued, None),
        ("-t", Valued, None),
        ("-T", Valued, None),
        ("-u", Flag, None),
        ("-v", Flag, None),
        ("-w", Valued, None),
        ("-W", Valued, None),
        ("-x", Valued, None),
        ("-y", Flag, None),
        ("-Y", Flag, None),
        ("-z", Valued, None),
        ("-c", Valued, Some("50")),
        ("-s", Valued, None),
        ("-#", Valued, Some("1")),
    ];
}

/// The parameter table of a raxmlHPC invocation. Parameters always render in the same order,
/// so switching one on or off only changes that parameter's slot in the command.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    params: Vec<Parameter>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            params: PARAMETER_TABLE
                .iter()
                .map(|&(name, kind, default)| Parameter::new(name, kind, default))
                .collect(),
        }
    }
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Result<&Parameter> {
        match self.params.iter().find(|p| p.name == name) {
            Some(param) => Ok(param),
            None => bail!(DataError::new(format!("Unknown raxmlHPC parameter: {name}"))),
        }
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Parameter> {
        match self.params.iter_mut().find(|p| p.name == name) {
            Some(param) => Ok(param),
            None => bail!(DataError::new(format!("Unknown raxmlHPC parameter: {name}"))),
        }
    }

    /// Switches a parameter on with the given value.
    ///
    /// # Example
    /// ```
    /// use phylo_raxml::raxml::Parameters;
    /// let mut params = Parameters::new();
    /// params.on("-m", "GTRCAT").unwrap();
    /// assert_eq!(params.value("-m"), Some("GTRCAT"));
    /// assert!(params.on("-Q", 1).is_err());
    /// ```
    pub fn on(&mut self, name: &str, value: impl Display) -> Result<()> {
        self.get_mut(name)?.on(value);
        Ok(())
    }

    pub fn off(&mut self, name: &str) -> Result<()> {
        self.get_mut(name)?.off();
        Ok(())
    }

    /// False for unknown parameters.
    pub fn is_on(&self, name: &str) -> bool {
        self.get(name).map(Parameter::is_on).unwrap_or(false)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).ok().and_then(Parameter::value)
    }

    /// Applies a whole parameter map. Flag parameters given the value `false` are switched off.
    pub fn update(&mut self, params: &ParamMap) -> Result<()> {
        for (name, value) in params {
            let param = self.get_mut(name)?;
            if param.kind == ParameterKind::Flag && value.eq_ignore_ascii_case("false") {
                param.off();
            } else {
                param.on(value);
            }
        }
        Ok(())
    }

    /// The active parameters joined into a command-line fragment.
    pub fn render(&self) -> String {
        self.params.iter().filter_map(Parameter::render).join(" ")
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }
}
