// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The match fields extracted from a classified packet.

use crate::api::Oxm;
use crate::api::OxmField;
use crate::api::OxmId;
use crate::api::OxmMasked;
use core::fmt;
use core::fmt::Display;
use serde::Deserialize;
use serde::Serialize;

/// The OXM values a packet exposes for flow matching.
///
/// There is at most one value per `(class, field)`. Entries keep the
/// order they were first added in, which makes [`MatchSet::to_bytes`]
/// deterministic; equality ignores that order.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MatchSet {
    fields: Vec<Oxm>,
}

impl MatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any existing value with the same id in
    /// place.
    pub fn set(&mut self, oxm: Oxm) {
        let id = oxm.id();
        match self.fields.iter_mut().find(|f| f.id() == id) {
            Some(slot) => *slot = oxm,
            None => self.fields.push(oxm),
        }
    }

    pub fn get(&self, field: OxmField) -> Option<&Oxm> {
        self.get_id(OxmId::basic(field))
    }

    pub fn get_id(&self, id: OxmId) -> Option<&Oxm> {
        self.fields.iter().find(|f| f.id() == id)
    }

    pub fn remove(&mut self, field: OxmField) -> Option<Oxm> {
        let id = OxmId::basic(field);
        let idx = self.fields.iter().position(|f| f.id() == id)?;
        Some(self.fields.remove(idx))
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Oxm> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encode every value as an OXM TLV.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for f in &self.fields {
            f.emit(&mut out);
        }
        out
    }

    /// Score a flow's match entries against these values.
    pub fn calc_hits(&self, flow: &[OxmMasked]) -> MatchHits {
        let mut hits = MatchHits::default();

        for entry in flow {
            let Some(ours) = self.get_id(entry.oxm.id()) else {
                hits.missed += 1;
                continue;
            };

            match &entry.mask {
                None if *ours == entry.oxm => hits.exact += 1,
                Some(mask)
                    if masked_eq(
                        &ours.value_bytes(),
                        &entry.oxm.value_bytes(),
                        mask,
                    ) =>
                {
                    hits.wildcard += 1
                }
                _ => hits.missed += 1,
            }
        }

        hits
    }
}

impl PartialEq for MatchSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.fields.iter().all(|f| other.get_id(f.id()) == Some(f))
    }
}

impl Eq for MatchSet {}

fn masked_eq(a: &[u8], b: &[u8], mask: &[u8]) -> bool {
    a.len() == b.len()
        && a.len() == mask.len()
        && a.iter().zip(b).zip(mask).all(|((a, b), m)| a & m == b & m)
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a Oxm;
    type IntoIter = core::slice::Iter<'a, Oxm>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// How a flow match scored against a packet.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
pub struct MatchHits {
    pub exact: usize,
    pub wildcard: usize,
    pub missed: usize,
}

impl MatchHits {
    /// Did every entry of the flow match?
    pub fn is_match(&self) -> bool {
        self.missed == 0
    }
}

impl Display for MatchHits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "exact={} wildcard={} missed={}",
            self.exact, self.wildcard, self.missed
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::Ipv4Addr;

    #[test]
    fn set_replaces_in_place() {
        let mut ms = MatchSet::new();
        ms.set(Oxm::EthType(0x0800));
        ms.set(Oxm::IpProto(6));
        ms.set(Oxm::EthType(0x8100));
        assert_eq!(ms.len(), 2);
        assert_eq!(
            ms.iter().cloned().collect::<Vec<_>>(),
            vec![Oxm::EthType(0x8100), Oxm::IpProto(6)]
        );
        assert_eq!(ms.remove(OxmField::EthType), Some(Oxm::EthType(0x8100)));
        assert_eq!(ms.get(OxmField::EthType), None);
        assert_eq!(ms.remove(OxmField::EthType), None);
    }

    #[test]
    fn equality_ignores_order() {
        let mut a = MatchSet::new();
        a.set(Oxm::EthType(0x0800));
        a.set(Oxm::IpProto(6));
        let mut b = MatchSet::new();
        b.set(Oxm::IpProto(6));
        b.set(Oxm::EthType(0x0800));
        assert_eq!(a, b);
        b.set(Oxm::IpProto(17));
        assert_ne!(a, b);
    }

    #[test]
    fn other_class_is_keyed_separately() {
        let mut ms = MatchSet::new();
        ms.set(Oxm::Other { class: 1, field: 5, value: vec![1] });
        ms.set(Oxm::EthType(0x0800));
        assert_eq!(ms.len(), 2);
        assert!(ms.get_id(OxmId { class: 1, field: 5 }).is_some());
    }

    #[test]
    fn to_bytes_in_insertion_order() {
        let mut ms = MatchSet::new();
        ms.set(Oxm::IpProto(17));
        ms.set(Oxm::EthType(0x0800));
        assert_eq!(
            ms.to_bytes(),
            vec![0x80, 0x00, 0x14, 0x01, 17, 0x80, 0x00, 0x0a, 0x02, 0x08, 0x00]
        );
    }

    #[test]
    fn hits() {
        let mut ms = MatchSet::new();
        ms.set(Oxm::EthType(0x0800));
        ms.set(Oxm::Ipv4Src(Ipv4Addr::from_const([10, 0, 0, 1])));
        ms.set(Oxm::TcpDst(80));

        let flow = vec![
            OxmMasked::exact(Oxm::EthType(0x0800)),
            OxmMasked::masked(
                Oxm::Ipv4Src(Ipv4Addr::from_const([10, 0, 0, 0])),
                vec![255, 255, 255, 0],
            ),
            OxmMasked::exact(Oxm::TcpDst(443)),
            OxmMasked::exact(Oxm::UdpDst(53)),
        ];

        let hits = ms.calc_hits(&flow);
        assert_eq!(hits, MatchHits { exact: 1, wildcard: 1, missed: 2 });
        assert!(!hits.is_match());
        assert!(ms.calc_hits(&flow[..2]).is_match());
    }
}
