//! Graphviz DOT export. Unlike the teacher's version (one `Dot` impl per
//! owned, self-recursive node type) everything here lives in a shared arena
//! addressed by `Handle`, so export is a set of free functions walking the
//! manager from one or more named roots rather than a trait each node type
//! implements.

use crate::common::HashSet;
use crate::handle::Handle;
use crate::manager::Manager;
use std::io::{self, Write};

const HEADER: &str = "digraph { layout=dot; overlap=false; splines=true; node [fontsize=10];\n";
const FOOTER: &str = "}\n";

/// Writes every BDD reachable from `roots`, respecting complement edges
/// (drawn as a dashed/hollow-arrowhead `else` edge).
pub fn write_bdd_dot<W: Write>(manager: &Manager, roots: &[(&str, Handle)], io: &mut W) -> io::Result<()> {
    io.write_all(HEADER.as_bytes())?;
    let mut visited = HashSet::default();
    for &(name, h) in roots {
        writeln!(io, "  \"root_{name}\" [shape=plaintext,label=\"{name}\"];")?;
        writeln!(
            io,
            "  \"root_{name}\" -> \"{}\" [style={}];",
            node_label(h.regularized()),
            if h.is_complement() { "dashed" } else { "solid" }
        )?;
        write_bdd_node(manager, h.regularized(), &mut visited, io)?;
    }
    io.write_all(FOOTER.as_bytes())
}

fn write_bdd_node<W: Write>(manager: &Manager, h: Handle, visited: &mut HashSet<Handle>, io: &mut W) -> io::Result<()> {
    if !visited.insert(h) {
        return Ok(());
    }
    if let Some(v) = manager.leaf_value(h) {
        writeln!(io, "  \"{}\" [shape=box,label=\"{v}\"];", node_label(h))?;
        return Ok(());
    }
    let index = manager.node(h).index;
    writeln!(
        io,
        "  \"{}\" [shape=ellipse,label=\"{}\"];",
        node_label(h),
        manager.bdd_label(index)
    )?;
    let (then_, else_) = manager.node(h).children().unwrap();
    writeln!(io, "  \"{}\" -> \"{}\" [style=solid];", node_label(h), node_label(then_.regularized()))?;
    writeln!(
        io,
        "  \"{}\" -> \"{}\" [style={}];",
        node_label(h),
        node_label(else_.regularized()),
        if else_.is_complement() { "dashed" } else { "solid" }
    )?;
    write_bdd_node(manager, then_.regularized(), visited, io)?;
    write_bdd_node(manager, else_.regularized(), visited, io)
}

/// Writes every ADD reachable from `roots`; leaves are boxed with their
/// numeric value, no complement edges to annotate.
pub fn write_add_dot<W: Write>(manager: &Manager, roots: &[(&str, Handle)], io: &mut W) -> io::Result<()> {
    io.write_all(HEADER.as_bytes())?;
    let mut visited = HashSet::default();
    for &(name, h) in roots {
        writeln!(io, "  \"root_{name}\" [shape=plaintext,label=\"{name}\"];")?;
        writeln!(io, "  \"root_{name}\" -> \"{}\";", node_label(h))?;
        write_bdd_node(manager, h, &mut visited, io)?;
    }
    io.write_all(FOOTER.as_bytes())
}

/// Writes every ZDD reachable from `roots`. ZDD handles are never
/// complemented; the elimination rule means a variable can be entirely
/// absent from the graph without a node ever existing for it.
pub fn write_zdd_dot<W: Write>(manager: &Manager, roots: &[(&str, Handle)], io: &mut W) -> io::Result<()> {
    io.write_all(HEADER.as_bytes())?;
    let mut visited = HashSet::default();
    for &(name, h) in roots {
        writeln!(io, "  \"root_{name}\" [shape=plaintext,label=\"{name}\"];")?;
        writeln!(io, "  \"root_{name}\" -> \"{}\";", node_label(h))?;
        write_zdd_node(manager, h, &mut visited, io)?;
    }
    io.write_all(FOOTER.as_bytes())
}

fn write_zdd_node<W: Write>(manager: &Manager, h: Handle, visited: &mut HashSet<Handle>, io: &mut W) -> io::Result<()> {
    if !visited.insert(h) {
        return Ok(());
    }
    if h == manager.zdd_zero() {
        writeln!(io, "  \"{}\" [shape=box,label=\"0\"];", node_label(h))?;
        return Ok(());
    }
    if h == manager.zdd_one() {
        writeln!(io, "  \"{}\" [shape=box,label=\"1\"];", node_label(h))?;
        return Ok(());
    }
    let index = manager.node(h).index;
    writeln!(io, "  \"{}\" [shape=ellipse,label=\"v{index}\"];", node_label(h))?;
    let (then_, else_) = manager.node(h).children().unwrap();
    writeln!(io, "  \"{}\" -> \"{}\" [style=solid];", node_label(h), node_label(then_))?;
    writeln!(io, "  \"{}\" -> \"{}\" [style=dashed];", node_label(h), node_label(else_))?;
    write_zdd_node(manager, then_, visited, io)?;
    write_zdd_node(manager, else_, visited, io)
}

fn node_label(h: Handle) -> String {
    format!("n{}", h.node_id())
}
