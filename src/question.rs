use crate::message::RecordType;

/// The record types a question may ask for. Unlike the wire-level
/// [`RecordType`], there is no catch-all: the planner only ever asks for
/// records it can resolve with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) enum QuestionKind {
    A,
    Aaaa,
    Ptr,
    Srv,
    Txt,
}

impl QuestionKind {
    pub(crate) fn record_type(&self) -> RecordType {
        match self {
            QuestionKind::A => RecordType::A,
            QuestionKind::Aaaa => RecordType::Aaaa,
            QuestionKind::Ptr => RecordType::Ptr,
            QuestionKind::Srv => RecordType::Srv,
            QuestionKind::Txt => RecordType::Txt,
        }
    }
}

/// A question the resolver wants answered: a record name and the kind of
/// record asked for. Questions compare by value so accumulating them in a
/// set collapses duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Question {
    pub(crate) name: String,
    pub(crate) kind: QuestionKind,
}

impl Question {
    pub(crate) fn new(name: impl Into<String>, kind: QuestionKind) -> Self {
        Question {
            name: name.into(),
            kind,
        }
    }
}
