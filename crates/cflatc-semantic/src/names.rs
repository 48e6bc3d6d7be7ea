//! Grammar vocabulary: terminal name constants and the non-terminal kind
//! enum the checker dispatches on.
//!
//! Per the "dynamic dispatch by string name" design note (spec §9), the
//! checker never matches on a node's raw `&str` name more than once: each
//! node is classified into a [`NonTerminalKind`] a single time, and every
//! later decision matches over that closed enum instead of re-comparing
//! strings.

/// Non-terminal names the shipped grammar (`config/grammar.def`) declares.
/// `from_name` is the one place a string is compared against this
/// vocabulary; everything downstream matches on the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NonTerminalKind {
    PrijevodnaJedinica,
    VanjskaDeklaracija,
    DefinicijaFunkcije,
    ListaParametara,
    DeklaracijaParametra,
    ImeTipa,
    SlozenaNaredba,
    ListaNaredbi,
    Naredba,
    IzrazNaredba,
    NaredbaGrananja,
    NaredbaPetlje,
    NaredbaSkoka,
    Deklaracija,
    Deklarator,
    Inicijalizator,
    Izraz,
    IzrazPridruzivanja,
    IzrazIli,
    IzrazI,
    IzrazBitIli,
    IzrazBitXor,
    IzrazBitI,
    IzrazJednakosti,
    IzrazOdnosa,
    IzrazZbrajanja,
    IzrazMnozenja,
    IzrazCastanja,
    UnarniIzraz,
    PostfixIzraz,
    ListaArgumenata,
    PrimarniIzraz,
}

impl NonTerminalKind {
    pub fn from_name(name: &str) -> Option<Self> {
        use NonTerminalKind::*;
        Some(match name {
            "prijevodna_jedinica" => PrijevodnaJedinica,
            "vanjska_deklaracija" => VanjskaDeklaracija,
            "definicija_funkcije" => DefinicijaFunkcije,
            "lista_parametara" => ListaParametara,
            "deklaracija_parametra" => DeklaracijaParametra,
            "ime_tipa" => ImeTipa,
            "slozena_naredba" => SlozenaNaredba,
            "lista_naredbi" => ListaNaredbi,
            "naredba" => Naredba,
            "izraz_naredba" => IzrazNaredba,
            "naredba_grananja" => NaredbaGrananja,
            "naredba_petlje" => NaredbaPetlje,
            "naredba_skoka" => NaredbaSkoka,
            "deklaracija" => Deklaracija,
            "deklarator" => Deklarator,
            "inicijalizator" => Inicijalizator,
            "izraz" => Izraz,
            "izraz_pridruzivanja" => IzrazPridruzivanja,
            "izraz_ili" => IzrazIli,
            "izraz_i" => IzrazI,
            "izraz_bit_ili" => IzrazBitIli,
            "izraz_bit_xor" => IzrazBitXor,
            "izraz_bit_i" => IzrazBitI,
            "izraz_jednakosti" => IzrazJednakosti,
            "izraz_odnosa" => IzrazOdnosa,
            "izraz_zbrajanja" => IzrazZbrajanja,
            "izraz_mnozenja" => IzrazMnozenja,
            "izraz_castanja" => IzrazCastanja,
            "unarni_izraz" => UnarniIzraz,
            "postfix_izraz" => PostfixIzraz,
            "lista_argumenata" => ListaArgumenata,
            "primarni_izraz" => PrimarniIzraz,
            _ => return None,
        })
    }
}

pub const KR_INT: &str = "KR_INT";
pub const KR_CHAR: &str = "KR_CHAR";
pub const KR_VOID: &str = "KR_VOID";
pub const KR_CONST: &str = "KR_CONST";
pub const KR_IF: &str = "KR_IF";
pub const KR_ELSE: &str = "KR_ELSE";
pub const KR_WHILE: &str = "KR_WHILE";
pub const KR_FOR: &str = "KR_FOR";
pub const KR_DO: &str = "KR_DO";
pub const KR_BREAK: &str = "KR_BREAK";
pub const KR_CONTINUE: &str = "KR_CONTINUE";
pub const KR_RETURN: &str = "KR_RETURN";

pub const IDN: &str = "IDN";
pub const BROJ: &str = "BROJ";
pub const ZNAK: &str = "ZNAK";
pub const NIZ_ZNAKOVA: &str = "NIZ_ZNAKOVA";

pub const L_ZAGRADA: &str = "L_ZAGRADA";
pub const D_ZAGRADA: &str = "D_ZAGRADA";
pub const L_VIT_ZAGRADA: &str = "L_VIT_ZAGRADA";
pub const D_VIT_ZAGRADA: &str = "D_VIT_ZAGRADA";
pub const L_UGL_ZAGRADA: &str = "L_UGL_ZAGRADA";
pub const D_UGL_ZAGRADA: &str = "D_UGL_ZAGRADA";
pub const TOCKAZAREZ: &str = "TOCKAZAREZ";
pub const ZAREZ: &str = "ZAREZ";

pub const OP_PRIDRUZI: &str = "OP_PRIDRUZI";
pub const OP_ILI: &str = "OP_ILI";
pub const OP_I: &str = "OP_I";
pub const OP_BOR: &str = "OP_BOR";
pub const OP_BXOR: &str = "OP_BXOR";
pub const OP_BAND: &str = "OP_BAND";
pub const OP_JEDNAKO: &str = "OP_JEDNAKO";
pub const OP_NJEDNAKO: &str = "OP_NJEDNAKO";
pub const OP_LT: &str = "OP_LT";
pub const OP_GT: &str = "OP_GT";
pub const OP_LEQ: &str = "OP_LEQ";
pub const OP_GEQ: &str = "OP_GEQ";
pub const PLUS: &str = "PLUS";
pub const MINUS: &str = "MINUS";
pub const OP_PUTA: &str = "OP_PUTA";
pub const OP_DIJELI: &str = "OP_DIJELI";
pub const OP_MOD: &str = "OP_MOD";
pub const OP_TILDA: &str = "OP_TILDA";
pub const OP_NEG: &str = "OP_NEG";
pub const OP_INC: &str = "OP_INC";
pub const OP_DEC: &str = "OP_DEC";

pub const MAIN: &str = "main";

#[cfg(test)]
mod names_tests {
    use super::*;

    #[test]
    fn recognises_every_declared_non_terminal() {
        assert_eq!(NonTerminalKind::from_name("naredba_skoka"), Some(NonTerminalKind::NaredbaSkoka));
        assert_eq!(NonTerminalKind::from_name("primarni_izraz"), Some(NonTerminalKind::PrimarniIzraz));
    }

    #[test]
    fn unknown_name_is_none() {
        assert_eq!(NonTerminalKind::from_name("not_a_real_rule"), None);
    }
}
