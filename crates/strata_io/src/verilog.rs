//! Structural Verilog reader.
//!
//! Reads the gate-level netlist subset: module/port declarations, wire and
//! port nets (with bus expansion), `assign` connectors and cell/module
//! instantiations with named or positional port lists. Behavioral
//! constructs are not supported and produce a parse error.

use crate::lex::{Cursor, LexConfig, Token, TokenKind, tokenize};
use strata_common::{ParseError, StrataError};
use strata_db::celllib::{INPIN_CELL, IOPIN_CELL, NETCON_CELL, OUTPIN_CELL};
use strata_db::{
    Archetype, Design, Instance, InstanceKey, InstanceType, IoDirection, ModuleKey, NetKey,
    PinKey,
};

/// Reads a structural Verilog stream into the design's module library.
pub fn read_verilog(design: &mut Design, source: &str) -> Result<(), ParseError> {
    let tokens = tokenize(source, &LexConfig::verilog())?;
    let mut reader = Reader {
        design,
        cursor: Cursor::new(tokens),
        netcon_counter: 0,
    };
    reader.parse()?;
    log::info!(
        "verilog netlist parsed: {} modules",
        reader.design.module_lib.modules.len()
    );
    Ok(())
}

struct Reader<'a> {
    design: &'a mut Design,
    cursor: Cursor,
    netcon_counter: usize,
}

/// Direction of a port declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PortDir {
    Input,
    Output,
    Inout,
}

impl<'a> Reader<'a> {
    fn parse(&mut self) -> Result<(), ParseError> {
        while !self.cursor.at_eof() {
            let token = self.cursor.expect_ident("'module'")?;
            if token.text != "module" {
                return Err(err_at(&token, format!("expected 'module', found '{}'", token.text)));
            }
            self.parse_module()?;
        }
        Ok(())
    }

    fn parse_module(&mut self) -> Result<(), ParseError> {
        let name = self.cursor.expect_ident("module name")?;
        let module_key = self
            .design
            .module_lib
            .create(&name.text)
            .map_err(|e| err_at(&name, e.to_string()))?;

        // port list: declaration order defines the module pin order
        if self.cursor.eat_punct('(') {
            if !self.cursor.eat_punct(')') {
                loop {
                    let port = self.cursor.expect_ident("port name")?;
                    let module = self
                        .design
                        .module_lib
                        .modules
                        .get_mut(module_key)
                        .expect("module created above");
                    module.cell.pins.create(&port.text);
                    if self.cursor.eat_punct(')') {
                        break;
                    }
                    self.cursor.expect_punct(',')?;
                }
            }
        }
        self.cursor.expect_punct(';')?;

        loop {
            if self.cursor.at_eof() {
                return Err(self.cursor.error("unexpected end of file inside module"));
            }
            let token = self.cursor.expect_ident("module item")?;
            match token.text.as_str() {
                "endmodule" => return Ok(()),
                "input" => self.parse_port_decl(module_key, PortDir::Input)?,
                "output" => self.parse_port_decl(module_key, PortDir::Output)?,
                "inout" => self.parse_port_decl(module_key, PortDir::Inout)?,
                "wire" => self.parse_wire_decl(module_key)?,
                "assign" => self.parse_assign(module_key)?,
                _ => self.parse_instantiation(module_key, token)?,
            }
        }
    }

    /// Parses an optional `[msb:lsb]` range.
    fn parse_range(&mut self) -> Result<Option<(i64, i64)>, ParseError> {
        if !self.cursor.eat_punct('[') {
            return Ok(None);
        }
        let msb = self.cursor.expect_number()? as i64;
        self.cursor.expect_punct(':')?;
        let lsb = self.cursor.expect_number()? as i64;
        self.cursor.expect_punct(']')?;
        Ok(Some((msb, lsb)))
    }

    /// Expands `name` over the range (or yields it unchanged).
    fn expand(name: &str, range: Option<(i64, i64)>) -> Vec<String> {
        match range {
            None => vec![name.to_owned()],
            Some((msb, lsb)) => {
                let (lo, hi) = (msb.min(lsb), msb.max(lsb));
                (lo..=hi).map(|i| format!("{name}[{i}]")).collect()
            }
        }
    }

    fn parse_port_decl(&mut self, module: ModuleKey, dir: PortDir) -> Result<(), ParseError> {
        let range = self.parse_range()?;
        loop {
            let name = self.cursor.expect_ident("port name")?;
            for expanded in Self::expand(&name.text, range) {
                self.create_port(module, &expanded, dir)
                    .map_err(|e| err_at(&name, e.to_string()))?;
            }
            if self.cursor.eat_punct(';') {
                return Ok(());
            }
            self.cursor.expect_punct(',')?;
        }
    }

    /// Creates the port net, module pin and the pseudo-cell pin instance.
    fn create_port(
        &mut self,
        module: ModuleKey,
        name: &str,
        dir: PortDir,
    ) -> Result<(), StrataError> {
        let (pseudo_name, inner_pin, io) = match dir {
            PortDir::Input => (INPIN_CELL, "Y", IoDirection::Input),
            PortDir::Output => (OUTPIN_CELL, "A", IoDirection::Output),
            PortDir::Inout => (IOPIN_CELL, "IO", IoDirection::Io),
        };
        let (pseudo_key, pseudo_cell) = self
            .design
            .cell_lib
            .lookup(pseudo_name)
            .expect("pseudo cells always exist");
        let pin_count = pseudo_cell.pins.len();
        let inner_pin_key = pseudo_cell
            .pins
            .key_of(inner_pin)
            .expect("pseudo cell pin layout is fixed");

        let module_obj = self
            .design
            .module_lib
            .modules
            .get_mut(module)
            .expect("module exists");

        // module-level pin in declaration order (created earlier when the
        // port list named it)
        let module_pin = module_obj.cell.pins.create(name);
        module_obj
            .cell
            .pins
            .get_mut(module_pin)
            .expect("pin created above")
            .direction = io;

        let netlist = module_obj
            .netlist
            .as_mut()
            .expect("modules created by the reader have netlists");
        let net = netlist.create_net(name)?;
        netlist.nets.get_mut(net).expect("net created").is_port_net = true;

        let instance = Instance::new(
            name,
            InstanceType::Pin,
            Archetype::Cell(pseudo_key),
            pin_count,
        );
        let ins_key = netlist.instances.add(instance)?;
        netlist.connect(ins_key, inner_pin_key, net)?;
        Ok(())
    }

    fn parse_wire_decl(&mut self, module: ModuleKey) -> Result<(), ParseError> {
        let range = self.parse_range()?;
        loop {
            let name = self.cursor.expect_ident("wire name")?;
            for expanded in Self::expand(&name.text, range) {
                let netlist = self.netlist_mut(module);
                netlist
                    .create_net(&expanded)
                    .map_err(|e| err_at(&name, e.to_string()))?;
            }
            if self.cursor.eat_punct(';') {
                return Ok(());
            }
            self.cursor.expect_punct(',')?;
        }
    }

    /// Parses a net reference: `name` or `name[index]`.
    fn parse_net_ref(&mut self) -> Result<(String, Token), ParseError> {
        let name = self.cursor.expect_ident("net name")?;
        if self.cursor.eat_punct('[') {
            let index = self.cursor.expect_number()? as i64;
            self.cursor.expect_punct(']')?;
            Ok((format!("{}[{index}]", name.text), name))
        } else {
            Ok((name.text.clone(), name))
        }
    }

    fn parse_assign(&mut self, module: ModuleKey) -> Result<(), ParseError> {
        let (left, left_token) = self.parse_net_ref()?;
        self.cursor.expect_punct('=')?;
        let (right, _) = self.parse_net_ref()?;
        self.cursor.expect_punct(';')?;

        let (netcon_key, netcon_cell) = self
            .design
            .cell_lib
            .lookup(NETCON_CELL)
            .expect("pseudo cells always exist");
        let pin_a = netcon_cell.pins.key_of("A").expect("NETCON has pin A");
        let pin_y = netcon_cell.pins.key_of("Y").expect("NETCON has pin Y");
        let pin_count = netcon_cell.pins.len();

        let ins_name = format!("__NETCON{}", self.netcon_counter);
        self.netcon_counter += 1;

        let netlist = self.netlist_mut(module);
        let left_net = lookup_net(netlist, &left, &left_token)?;
        let right_net = lookup_net(netlist, &right, &left_token)?;

        let instance = Instance::new(
            &ins_name,
            InstanceType::NetCon,
            Archetype::Cell(netcon_key),
            pin_count,
        );
        let ins_key = netlist
            .instances
            .add(instance)
            .map_err(|e| err_at(&left_token, e.to_string()))?;
        netlist
            .connect(ins_key, pin_a, right_net)
            .map_err(|e| err_at(&left_token, e.to_string()))?;
        netlist
            .connect(ins_key, pin_y, left_net)
            .map_err(|e| err_at(&left_token, e.to_string()))?;
        Ok(())
    }

    fn parse_instantiation(&mut self, module: ModuleKey, archetype: Token) -> Result<(), ParseError> {
        let ins_name = self.cursor.expect_ident("instance name")?;

        // resolve the archetype: cells take precedence over modules
        let (arch, itype, pin_count) =
            if let Some((key, cell)) = self.design.cell_lib.lookup(&archetype.text) {
                (Archetype::Cell(key), InstanceType::Cell, cell.pins.len())
            } else if let Some((key, sub)) = self.design.module_lib.lookup(&archetype.text) {
                (
                    Archetype::Module(key),
                    InstanceType::Module,
                    sub.cell.pins.len(),
                )
            } else {
                return Err(err_at(
                    &archetype,
                    format!("cannot find cell or module '{}'", archetype.text),
                ));
            };

        let instance = Instance::new(&ins_name.text, itype, arch, pin_count);
        let ins_key = self
            .netlist_mut(module)
            .instances
            .add(instance)
            .map_err(|e| err_at(&ins_name, e.to_string()))?;

        self.cursor.expect_punct('(')?;
        if self.cursor.eat_punct(')') {
            self.cursor.expect_punct(';')?;
            return Ok(());
        }

        if self.cursor.peek().kind == TokenKind::Punct && self.cursor.peek().text == "." {
            // named connections take precedence over positional ones
            loop {
                self.cursor.expect_punct('.')?;
                let pin_name = self.cursor.expect_ident("pin name")?;
                self.cursor.expect_punct('(')?;
                let (net_name, net_token) = self.parse_net_ref()?;
                self.cursor.expect_punct(')')?;

                let pin_key = self
                    .archetype_pin(arch, &pin_name.text)
                    .ok_or_else(|| {
                        err_at(
                            &pin_name,
                            format!("'{}' has no pin '{}'", archetype.text, pin_name.text),
                        )
                    })?;
                self.connect_pin(module, ins_key, pin_key, &net_name, &net_token)?;

                if self.cursor.eat_punct(')') {
                    break;
                }
                self.cursor.expect_punct(',')?;
            }
        } else {
            let mut pin_index = 0u32;
            loop {
                let (net_name, net_token) = self.parse_net_ref()?;
                self.connect_pin(module, ins_key, PinKey::from_raw(pin_index), &net_name, &net_token)?;
                pin_index += 1;
                if self.cursor.eat_punct(')') {
                    break;
                }
                self.cursor.expect_punct(',')?;
            }
        }
        self.cursor.expect_punct(';')?;
        Ok(())
    }

    fn connect_pin(
        &mut self,
        module: ModuleKey,
        ins: InstanceKey,
        pin: PinKey,
        net_name: &str,
        net_token: &Token,
    ) -> Result<(), ParseError> {
        let netlist = self.netlist_mut(module);
        let net = lookup_net(netlist, net_name, net_token)?;
        netlist
            .connect(ins, pin, net)
            .map_err(|e| err_at(net_token, e.to_string()))
    }

    fn archetype_pin(&self, archetype: Archetype, name: &str) -> Option<PinKey> {
        match archetype {
            Archetype::Cell(key) => self.design.cell_lib.cells.get(key)?.pins.key_of(name),
            Archetype::Module(key) => self
                .design
                .module_lib
                .modules
                .get(key)?
                .cell
                .pins
                .key_of(name),
        }
    }

    fn netlist_mut(&mut self, module: ModuleKey) -> &mut strata_db::Netlist {
        self.design
            .module_lib
            .modules
            .get_mut(module)
            .expect("module exists")
            .netlist
            .as_mut()
            .expect("modules created by the reader have netlists")
    }
}

fn lookup_net(
    netlist: &strata_db::Netlist,
    name: &str,
    token: &Token,
) -> Result<NetKey, ParseError> {
    netlist
        .nets
        .key_of(name)
        .ok_or_else(|| err_at(token, format!("cannot find net '{name}'")))
}

fn err_at(token: &Token, msg: impl Into<String>) -> ParseError {
    ParseError::new(token.line, token.col, msg)
}
