use std::io::{Read, Write};

use bincode::{de::Decoder, error::DecodeError, Decode, Encode};

use crate::cost_model::{
    CostModelKind, EditCostModel, EmpiricalCostModel, UniformCostModel,
};
use crate::errors::{QspellError, Result};
use crate::language_model::LanguageModel;

/// Header written at the beginning of every model snapshot.
pub const MODEL_MAGIC: &[u8] = b"QspellModel 0.1.0\n";

/// Upper bound on the bytes a model body may claim while decoding.
const MAX_MODEL_BYTES: usize = 1 << 30;

fn decode_config() -> impl bincode::config::Config {
    bincode::config::standard().with_limit::<MAX_MODEL_BYTES>()
}

/// Both edit-cost models, trained together so either can be selected at query time.
#[derive(Clone, Debug, Default, Encode)]
pub struct NoisyChannelModel {
    uniform: UniformCostModel,
    empirical: EmpiricalCostModel,
}

impl Decode for NoisyChannelModel {
    fn decode<D: Decoder>(decoder: &mut D) -> Result<Self, DecodeError> {
        Ok(Self {
            uniform: Decode::decode(decoder)?,
            empirical: Decode::decode(decoder)?,
        })
    }
}

impl NoisyChannelModel {
    pub const fn new(uniform: UniformCostModel, empirical: EmpiricalCostModel) -> Self {
        Self { uniform, empirical }
    }

    pub const fn uniform(&self) -> &UniformCostModel {
        &self.uniform
    }

    pub const fn empirical(&self) -> &EmpiricalCostModel {
        &self.empirical
    }

    /// Selects the edit-cost model of the given kind.
    pub const fn cost_model(&self, kind: CostModelKind) -> EditCostModel<'_> {
        match kind {
            CostModelKind::Uniform => EditCostModel::Uniform(&self.uniform),
            CostModelKind::Empirical => EditCostModel::Empirical(&self.empirical),
        }
    }
}

/// Model data.
#[derive(Clone, Debug, Encode)]
pub struct Model {
    language_model: LanguageModel,
    channel_model: NoisyChannelModel,
}

impl Decode for Model {
    fn decode<D: Decoder>(decoder: &mut D) -> Result<Self, DecodeError> {
        Ok(Self {
            language_model: Decode::decode(decoder)?,
            channel_model: Decode::decode(decoder)?,
        })
    }
}

impl Model {
    pub const fn new(language_model: LanguageModel, channel_model: NoisyChannelModel) -> Self {
        Self {
            language_model,
            channel_model,
        }
    }

    pub const fn language_model(&self) -> &LanguageModel {
        &self.language_model
    }

    pub const fn channel_model(&self) -> &NoisyChannelModel {
        &self.channel_model
    }

    /// Selects the edit-cost model of the given kind.
    pub const fn cost_model(&self, kind: CostModelKind) -> EditCostModel<'_> {
        self.channel_model.cost_model(kind)
    }

    /// Exports the model data.
    ///
    /// # Arguments
    ///
    /// * `wtr` - Byte-oriented sink object.
    ///
    /// # Errors
    ///
    /// When `wtr` generates an error, it will be returned as is.
    pub fn write<W>(&self, wtr: &mut W) -> Result<()>
    where
        W: Write,
    {
        wtr.write_all(MODEL_MAGIC)?;
        let config = bincode::config::standard();
        bincode::encode_into_std_write(self, wtr, config)?;
        Ok(())
    }

    /// Creates a model from a reader.
    ///
    /// # Arguments
    ///
    /// * `rdr` - A data source.
    ///
    /// # Returns
    ///
    /// A model data read from `rdr`.
    ///
    /// # Errors
    ///
    /// When `rdr` generates an error, it will be returned as is.
    /// If the data does not start with [`MODEL_MAGIC`] or has bytes left after the model,
    /// [`QspellError::InvalidModel`] will be returned. A corrupt body is a
    /// [`QspellError::DecodeError`].
    pub fn read<R>(rdr: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let mut magic = [0; MODEL_MAGIC.len()];
        rdr.read_exact(&mut magic).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => {
                QspellError::invalid_model("model data is too short")
            }
            _ => QspellError::from(e),
        })?;
        if magic.as_slice() != MODEL_MAGIC {
            return Err(QspellError::invalid_model(
                "model version mismatch or not a qspell model",
            ));
        }
        let model = bincode::decode_from_std_read(rdr, decode_config())?;
        let mut rest = [0; 1];
        if rdr.read(&mut rest)? != 0 {
            return Err(QspellError::invalid_model("trailing data after the model"));
        }
        Ok(model)
    }

    /// Exports the model data into a byte vector.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = vec![];
        self.write(&mut buf)?;
        Ok(buf)
    }

    /// Creates a model from a byte slice.
    ///
    /// # Errors
    ///
    /// Same as [`Model::read`].
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let Some(body) = data.strip_prefix(MODEL_MAGIC) else {
            return Err(QspellError::invalid_model(
                "model version mismatch or not a qspell model",
            ));
        };
        let (model, len) = bincode::decode_from_slice(body, decode_config())?;
        if len != body.len() {
            return Err(QspellError::invalid_model("trailing data after the model"));
        }
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::cost_model::EmpiricalCostTrainer;

    fn build_model() -> Model {
        let lm = LanguageModel::train(["stanford university", "stanford cardinal"]);
        let mut trainer = EmpiricalCostTrainer::new();
        trainer.push_pair("stanofrd", "stanford").unwrap();
        let channel = NoisyChannelModel::new(UniformCostModel::default(), trainer.train());
        Model::new(lm, channel)
    }

    #[test]
    fn test_write_read() {
        let model = build_model();

        let mut buf = vec![];
        model.write(&mut buf).unwrap();
        assert!(buf.starts_with(MODEL_MAGIC));

        let loaded = Model::read(&mut buf.as_slice()).unwrap();
        let lm = loaded.language_model();
        assert_eq!(2, lm.unigrams().count("stanford"));
        assert_eq!(
            model.language_model().bigram_prob("stanford", "university"),
            lm.bigram_prob("stanford", "university")
        );
        assert_eq!(vec!["stanford"], lm.terms_preceding("cardinal"));
        assert_eq!(
            model
                .cost_model(CostModelKind::Empirical)
                .edit_probability("stanford", "stanofrd", 1),
            loaded
                .cost_model(CostModelKind::Empirical)
                .edit_probability("stanford", "stanofrd", 1)
        );
    }

    #[test]
    fn test_bytes_are_deterministic() {
        let a = build_model().to_bytes().unwrap();
        let b = build_model().to_bytes().unwrap();
        assert_eq!(a, b);

        let loaded = Model::from_bytes(&a).unwrap();
        assert_eq!(a, loaded.to_bytes().unwrap());
    }

    #[test]
    fn test_read_bad_magic() {
        let mut buf = build_model().to_bytes().unwrap();
        buf[0] = b'X';

        assert!(matches!(
            Model::read(&mut buf.as_slice()),
            Err(QspellError::InvalidModel(_))
        ));
        assert!(matches!(
            Model::from_bytes(&buf),
            Err(QspellError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_read_too_short() {
        assert!(matches!(
            Model::read(&mut &b"Qspell"[..]),
            Err(QspellError::InvalidModel(_))
        ));
        assert!(Model::from_bytes(MODEL_MAGIC).is_err());
    }

    #[test]
    fn test_read_corrupt_length() {
        let mut buf = MODEL_MAGIC.to_vec();
        buf.push(0xFD);
        buf.extend_from_slice(&(u64::MAX / 4).to_le_bytes());

        assert!(matches!(
            Model::from_bytes(&buf),
            Err(QspellError::DecodeError(_))
        ));
        assert!(matches!(
            Model::read(&mut buf.as_slice()),
            Err(QspellError::DecodeError(_))
        ));

        // One unigram whose term claims a huge length.
        let mut buf = MODEL_MAGIC.to_vec();
        buf.push(1);
        buf.push(0xFD);
        buf.extend_from_slice(&(1u64 << 40).to_le_bytes());
        assert!(matches!(
            Model::from_bytes(&buf),
            Err(QspellError::DecodeError(_))
        ));
    }

    #[test]
    fn test_read_trailing_data() {
        let mut buf = build_model().to_bytes().unwrap();
        buf.push(0);

        assert!(matches!(
            Model::read(&mut buf.as_slice()),
            Err(QspellError::InvalidModel(_))
        ));
        assert!(matches!(
            Model::from_bytes(&buf),
            Err(QspellError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_cost_model_selection() {
        let model = build_model();

        assert_eq!(
            CostModelKind::Uniform,
            model.cost_model(CostModelKind::Uniform).kind()
        );
        assert_eq!(
            CostModelKind::Empirical,
            model.cost_model(CostModelKind::Empirical).kind()
        );
    }
}
