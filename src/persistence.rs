//! # Persistência: O Arquivo `.pl` da Base de Conhecimento
//!
//! O arquivo Prolog é a fonte de verdade da sessão: o motor lógico é sempre
//! (re)carregado a partir dele, e regras aprendidas são anexadas nele.
//!
//! ## Ciclo de Vida
//!
//! ```text
//! início ──► KbFile::load()     lê o arquivo e guarda um snapshot
//!   │
//!   ├──► append_rule()          "\n<regra>\n" no fim do arquivo
//!   ├──► append_rule()          ...
//!   │
//! fim ───► restore()            reescreve o snapshot, byte a byte
//! ```
//!
//! ## ⚠️ Atomicidade
//!
//! Nem o append nem o restore são atômicos. Um append cuja recarga falha é
//! desfeito com [`truncate()`](KbFile::truncate). Ctrl-C no meio de um
//! turno passa por um clone do [`KbFile`] guardado pelo handler de sinal;
//! só um `SIGKILL` deixa as regras aprendidas no arquivo.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::Rule;

/// Arquivo da KB com o snapshot capturado na abertura da sessão.
#[derive(Clone, Debug)]
pub struct KbFile {
    /// Caminho do arquivo `.pl`.
    path: PathBuf,
    /// Conteúdo original, usado pelo [`restore()`](KbFile::restore).
    snapshot: String,
}

impl KbFile {
    /// Lê o arquivo da KB inteiro e guarda o snapshot.
    ///
    /// # Erros
    ///
    /// Falha se o arquivo não existir ou não puder ser lido: a KB é
    /// obrigatória para iniciar a sessão.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = std::fs::read_to_string(&path)
            .with_context(|| format!("Falha ao ler a KB em {}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = snapshot.len(), "KB carregada do disco");
        Ok(Self { path, snapshot })
    }

    /// Caminho do arquivo.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Conteúdo do arquivo no início da sessão.
    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }

    /// Anexa uma regra ao fim do arquivo, cercada por quebras de linha.
    ///
    /// Retorna o tamanho do arquivo antes do append, para
    /// [`truncate()`](KbFile::truncate).
    pub fn append_rule(&self, rule: &Rule) -> Result<u64> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Falha ao abrir {} para escrita", self.path.display()))?;
        let previous_len = file
            .metadata()
            .with_context(|| format!("Falha ao ler metadados de {}", self.path.display()))?
            .len();
        write!(file, "\n{}\n", rule.text())
            .with_context(|| format!("Falha ao anexar regra em {}", self.path.display()))?;
        tracing::debug!(predicate = rule.predicate(), "KB: regra anexada ao arquivo");
        Ok(previous_len)
    }

    /// Corta o arquivo de volta a `len` bytes, desfazendo um append.
    pub fn truncate(&self, len: u64) -> Result<()> {
        OpenOptions::new()
            .write(true)
            .open(&self.path)
            .and_then(|file| file.set_len(len))
            .with_context(|| format!("Falha ao desfazer o append em {}", self.path.display()))?;
        tracing::warn!(path = %self.path.display(), bytes = len, "KB: append desfeito");
        Ok(())
    }

    /// Reescreve o arquivo com o conteúdo original da sessão.
    pub fn restore(&self) -> Result<()> {
        std::fs::write(&self.path, &self.snapshot)
            .with_context(|| format!("Falha ao restaurar {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), "KB restaurada ao estado original");
        Ok(())
    }
}
