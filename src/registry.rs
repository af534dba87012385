use crate::cursor::Cursor;
use crate::decode::{self, BoxFields};
use crate::error::Result;
use crate::header::{read_full_box, BoxHeader, FullBoxHeader};
use crate::node::BoxNode;
use crate::tree::Parent;
use std::collections::HashMap;
use std::sync::LazyLock;

/// One box as carved out of the input: resolved header plus the full byte
/// range (header included), clamped to the enclosing range.
pub struct RawBox<'a> {
    pub header: BoxHeader,
    pub data: &'a [u8],
}

impl<'a> RawBox<'a> {
    /// Body bytes, i.e. everything after the (possibly extended) header.
    pub fn body(&self) -> &'a [u8] {
        let h = (self.header.header_len as usize).min(self.data.len());
        &self.data[h..]
    }

    pub fn body_offset(&self) -> u64 {
        self.header.offset + self.header.header_len
    }

    pub fn cursor(&self) -> Cursor<'a> {
        Cursor::new(self.body(), self.body_offset())
    }

    /// A node carrying only the structural metadata of this box.
    pub fn node(&self) -> BoxNode {
        BoxNode {
            offset: self.header.offset,
            size: self.header.size,
            typ: self.header.typ.clone(),
            largesize: self.header.largesize,
            version: None,
            flags: None,
            fields: BoxFields::None,
            children: Vec::new(),
        }
    }

    /// Read the full-box sub-header. Returns the node primed with version
    /// and flags, the sub-header itself, and a cursor at the first body byte
    /// after it.
    pub fn full_box(&self) -> Result<(BoxNode, FullBoxHeader, Cursor<'a>)> {
        let mut cur = self.cursor();
        let fb = read_full_box(&mut cur)?;
        let mut node = self.node();
        node.version = Some(fb.version);
        node.flags = Some(fb.flags);
        Ok((node, fb, cur))
    }
}

/// The per-type decode contract. `Ok(None)` means the box was recognized
/// and consumed but contributes no node (opaque stub types).
pub type DecodeFn = fn(&RawBox<'_>, Option<&Parent>, usize) -> Result<Option<BoxNode>>;

/// Mapping from trimmed type code to decode function. Built once at first
/// use and never mutated afterwards.
pub struct Registry {
    map: HashMap<&'static str, DecodeFn>,
}

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::standard);

/// The process-wide registry of every recognized box type.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

impl Registry {
    pub fn contains(&self, code: &str) -> bool {
        self.map.contains_key(code)
    }

    pub fn get(&self, code: &str) -> Option<DecodeFn> {
        self.map.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Every recognized box type.
    pub fn standard() -> Self {
        use decode::{audio, delivery, file, fragment, meta, movie, sample_table, streaming};

        let mut m: HashMap<&'static str, DecodeFn> = HashMap::new();

        // File level
        m.insert("ftyp", file::ftyp);
        m.insert("styp", file::ftyp);
        m.insert("pdin", file::pdin);
        m.insert("mdat", file::opaque);
        m.insert("free", file::opaque);
        m.insert("skip", file::opaque);
        m.insert("idat", file::opaque);
        m.insert("cprt", file::cprt);
        m.insert("xml", file::xml);
        m.insert("bxml", file::bxml);

        // Movie structure
        m.insert("moov", decode::container);
        m.insert("trak", decode::container);
        m.insert("trgr", decode::container);
        m.insert("edts", decode::container);
        m.insert("mdia", decode::container);
        m.insert("minf", decode::container);
        m.insert("dinf", decode::container);
        m.insert("udta", decode::container);
        m.insert("strk", decode::container);
        m.insert("strd", decode::container);
        m.insert("mvhd", movie::mvhd);
        m.insert("tkhd", movie::tkhd);
        m.insert("tref", movie::tref);
        m.insert("msrc", movie::msrc);
        m.insert("elst", movie::elst);
        m.insert("mdhd", movie::mdhd);
        m.insert("hdlr", movie::hdlr);
        m.insert("elng", movie::elng);
        m.insert("vmhd", movie::vmhd);
        m.insert("smhd", movie::smhd);
        m.insert("hmhd", movie::hmhd);
        m.insert("sthd", movie::sthd);
        m.insert("nmhd", movie::nmhd);
        m.insert("dref", movie::dref);
        m.insert("url", movie::url);
        m.insert("urn", movie::urn);
        m.insert("kind", movie::kind);
        m.insert("tsel", movie::tsel);
        m.insert("stri", movie::stri);
        m.insert("stsg", movie::stsg);

        // Sample tables
        m.insert("stbl", decode::container);
        m.insert("stsd", sample_table::stsd);
        m.insert("stts", sample_table::stts);
        m.insert("ctts", sample_table::ctts);
        m.insert("cslg", sample_table::cslg);
        m.insert("stsc", sample_table::stsc);
        m.insert("stsz", sample_table::stsz);
        m.insert("stz2", sample_table::stz2);
        m.insert("stco", sample_table::stco);
        m.insert("co64", sample_table::co64);
        m.insert("stss", sample_table::stss);
        m.insert("stsh", sample_table::stsh);
        m.insert("padb", sample_table::padb);
        m.insert("stdp", sample_table::stdp);
        m.insert("sdtp", sample_table::sdtp);
        m.insert("sbgp", sample_table::sbgp);
        m.insert("sgpd", sample_table::sgpd);
        m.insert("subs", sample_table::subs);
        m.insert("saiz", sample_table::saiz);
        m.insert("saio", sample_table::saio);

        // Movie fragments
        m.insert("mvex", decode::container);
        m.insert("moof", decode::container);
        m.insert("traf", decode::container);
        m.insert("mfra", decode::container);
        m.insert("mehd", fragment::mehd);
        m.insert("trex", fragment::trex);
        m.insert("trep", fragment::trep);
        m.insert("assp", fragment::assp);
        m.insert("leva", fragment::leva);
        m.insert("mfhd", fragment::mfhd);
        m.insert("tfhd", fragment::tfhd);
        m.insert("trun", fragment::trun);
        m.insert("tfdt", fragment::tfdt);
        m.insert("tfra", fragment::tfra);
        m.insert("mfro", fragment::mfro);

        // Meta, items, protection
        m.insert("meta", meta::meta);
        m.insert("iloc", meta::iloc);
        m.insert("ipro", meta::ipro);
        m.insert("sinf", decode::container);
        m.insert("rinf", decode::container);
        m.insert("schi", decode::container);
        m.insert("srpp", meta::srpp);
        m.insert("frma", meta::frma);
        m.insert("schm", meta::schm);
        m.insert("stvi", meta::stvi);
        m.insert("iinf", meta::iinf);
        m.insert("infe", meta::infe);
        m.insert("pitm", meta::pitm);
        m.insert("iref", meta::iref);
        m.insert("meco", decode::container);
        m.insert("mere", meta::mere);

        // Item reference entries; layout depends on the enclosing iref.
        for code in ["hint", "cdsc", "font", "hind", "vdep", "vplx", "subt"] {
            m.insert(code, meta::item_reference);
        }

        // File delivery item framework
        m.insert("fiin", delivery::fiin);
        m.insert("paen", decode::container);
        m.insert("fire", delivery::fire);
        m.insert("fpar", delivery::fpar);
        m.insert("fecr", delivery::fecr);
        m.insert("segr", delivery::segr);
        m.insert("gitn", delivery::gitn);
        m.insert("extr", delivery::extr);
        m.insert("feci", delivery::feci);
        m.insert("cinf", decode::container);

        // Segment indexing / timing
        m.insert("sidx", streaming::sidx);
        m.insert("ssix", streaming::ssix);
        m.insert("prft", streaming::prft);

        // Audio layout and loudness
        m.insert("ludt", decode::container);
        m.insert("chnl", audio::chnl);
        m.insert("dmix", audio::dmix);
        m.insert("tlou", audio::loudness);
        m.insert("alou", audio::loudness);

        // Recognized codes with opaque or codec-specific payloads: the box
        // is consumed so the walk stays aligned, but no node is emitted.
        for code in [
            "alst", "rap", "tele", "btrt", "txtC", "uri", "uriI", "stpp", "sbtt",
            "tims", "tsro", "snro", "fdsa", "fdpa", "rrtp", "rsrp", "rssr",
            "clap", "pasp", "srat", "icpv", "hnti", "rtp", "sdp", "trpy",
            "nump", "tpyl", "totl", "npck", "tpay", "maxr", "dmed", "dimm",
            "drep", "tmin", "tmax", "pmax", "dmax", "payt", "fdp", "rm2t",
            "sm2t", "tPAT", "tPMT", "tOD", "tsti", "istm", "pm2t", "tssy",
            "rtpx", "rcsr", "ccid", "sroc", "prtp", "rash", "sap", "colr",
            "stxt", "metx", "mett", "urim",
        ] {
            m.insert(code, decode::skip_box);
        }

        Registry { map: m }
    }
}
