// ABOUTME: Self-describing binary encoding for opaque Hissp leaves (§4.H)

//! Serializes an `Obj` that has no known host literal into a stable binary
//! blob plus a printable repr for the comment line the compiler emits
//! above the loader expression. Shared sub-objects (the `[[]] * 3` case in
//! §9) are memoized by `Arc` pointer identity during encoding so the blob
//! preserves that identity — a real host-side loader (out of scope, §4.G)
//! would reconstruct one shared object and alias it, exactly as pickle
//! does for repeated references within a single stream.

use crate::value::Obj;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
enum WireNode {
    Int(i64),
    Float(u64), // bits, so NaN/identical floats compare and hash predictably
    Complex(u64, u64),
    Bool(bool),
    None,
    Ellipsis,
    Bytes(Vec<u8>),
    Str(String),
    List(Vec<u32>),
    Tuple(Vec<u32>),
    Dict(Vec<(u32, u32)>),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OpaqueBlob {
    table: Vec<WireNode>,
    root: u32,
}

fn intern(obj: &Obj, table: &mut Vec<WireNode>, memo: &mut HashMap<usize, u32>) -> u32 {
    let ptr_key = match obj {
        Obj::List(items) => Some(Arc::as_ptr(items) as *const () as usize),
        Obj::TupleLit(items) => Some(Arc::as_ptr(items) as *const () as usize),
        Obj::Dict(items) => Some(Arc::as_ptr(items) as *const () as usize),
        _ => None,
    };
    if let Some(key) = ptr_key {
        if let Some(&id) = memo.get(&key) {
            return id;
        }
    }
    let idx = table.len() as u32;
    // Reserve the slot before recursing so a cycle through this pointer
    // (impossible with today's immutable `Obj`, but kept for robustness if
    // a mutable variant is ever added) resolves to this index rather than
    // re-entering.
    table.push(WireNode::None);
    if let Some(key) = ptr_key {
        memo.insert(key, idx);
    }
    let node = match obj {
        Obj::Int(n) => WireNode::Int(*n),
        Obj::Float(f) => WireNode::Float(f.to_bits()),
        Obj::Complex(re, im) => WireNode::Complex(re.to_bits(), im.to_bits()),
        Obj::Bool(b) => WireNode::Bool(*b),
        Obj::None => WireNode::None,
        Obj::Ellipsis => WireNode::Ellipsis,
        Obj::Bytes(b) => WireNode::Bytes((**b).clone()),
        Obj::Str(s) => WireNode::Str(s.to_string()),
        Obj::List(items) => WireNode::List(items.iter().map(|c| intern(c, table, memo)).collect()),
        Obj::TupleLit(items) => WireNode::Tuple(items.iter().map(|c| intern(c, table, memo)).collect()),
        Obj::Dict(items) => WireNode::Dict(
            items
                .iter()
                .map(|(k, v)| (intern(k, table, memo), intern(v, table, memo)))
                .collect(),
        ),
    };
    table[idx as usize] = node;
    idx
}

pub fn encode(obj: &Obj) -> OpaqueBlob {
    let mut table = Vec::new();
    let mut memo = HashMap::new();
    let root = intern(obj, &mut table, &mut memo);
    OpaqueBlob { table, root }
}

pub fn encode_bytes(obj: &Obj) -> Vec<u8> {
    bincode::serialize(&encode(obj)).expect("Obj encodes to a finite, acyclic wire graph")
}

fn build(i: u32, table: &[WireNode], built: &mut Vec<Option<Obj>>) -> Obj {
    if let Some(existing) = &built[i as usize] {
        return existing.clone();
    }
    let obj = match &table[i as usize] {
        WireNode::Int(n) => Obj::Int(*n),
        WireNode::Float(bits) => Obj::Float(f64::from_bits(*bits)),
        WireNode::Complex(re, im) => Obj::Complex(f64::from_bits(*re), f64::from_bits(*im)),
        WireNode::Bool(b) => Obj::Bool(*b),
        WireNode::None => Obj::None,
        WireNode::Ellipsis => Obj::Ellipsis,
        WireNode::Bytes(b) => Obj::Bytes(Arc::new(b.clone())),
        WireNode::Str(s) => Obj::Str(Arc::from(s.as_str())),
        WireNode::List(ids) => {
            Obj::List(Arc::new(ids.iter().map(|&j| build(j, table, built)).collect()))
        }
        WireNode::Tuple(ids) => {
            Obj::TupleLit(Arc::new(ids.iter().map(|&j| build(j, table, built)).collect()))
        }
        WireNode::Dict(pairs) => Obj::Dict(Arc::new(
            pairs.iter().map(|&(k, v)| (build(k, table, built), build(v, table, built))).collect(),
        )),
    };
    built[i as usize] = Some(obj.clone());
    obj
}

/// Decodes a blob back into an `Obj`. Not needed by the compiler (which
/// only ever encodes, since the decoded value lives in the host runtime,
/// §4.G) — provided so the encoding's correctness, including identity
/// preservation, is independently testable.
pub fn decode(blob: &OpaqueBlob) -> Obj {
    let mut built = vec![None; blob.table.len()];
    build(blob.root, &blob.table, &mut built)
}

/// A printable repr for the comment line the compiler places above a
/// pickle-loader expression (§4.H).
pub fn repr(obj: &Obj) -> String {
    match obj {
        Obj::Int(n) => n.to_string(),
        Obj::Float(f) => f.to_string(),
        Obj::Complex(re, im) => format!("({re}+{im}j)"),
        Obj::Bool(b) => if *b { "True".into() } else { "False".into() },
        Obj::None => "None".into(),
        Obj::Ellipsis => "...".into(),
        Obj::Bytes(b) => format!("b{:?}", String::from_utf8_lossy(b)),
        Obj::Str(s) => format!("{s:?}"),
        Obj::List(items) => format!("[{}]", items.iter().map(repr).collect::<Vec<_>>().join(", ")),
        Obj::TupleLit(items) => {
            let inner = items.iter().map(repr).collect::<Vec<_>>().join(", ");
            if items.len() == 1 { format!("({inner},)") } else { format!("({inner})") }
        }
        Obj::Dict(items) => format!(
            "{{{}}}",
            items.iter().map(|(k, v)| format!("{}: {}", repr(k), repr(v))).collect::<Vec<_>>().join(", ")
        ),
    }
}
